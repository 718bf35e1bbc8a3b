//! Domain data structures for sessions, pickup schedules, and special pickups.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ports::PortError;

/// Day of the month, `1..=31`.
pub type Day = u32;

/// Highest day number a schedule may carry.
pub const MAX_DAY: Day = 31;

/// Backend identifiers arrive either as JSON numbers or as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<NumberOrText> for String {
    fn from(raw: NumberOrText) -> Self {
        match raw {
            NumberOrText::Integer(number) => number.to_string(),
            NumberOrText::Float(number) => number.to_string(),
            NumberOrText::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "NumberOrText")]
/// Identifier of a portal user.
pub struct UserId(pub String);

impl From<NumberOrText> for UserId {
    fn from(raw: NumberOrText) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "NumberOrText")]
/// Identifier of a collection route.
pub struct RouteId(pub String);

impl From<NumberOrText> for RouteId {
    fn from(raw: NumberOrText) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The signed-in user for one session.
///
/// Passed explicitly into everything that needs to know who is acting; it is
/// valid until logout and never persisted.
pub struct SessionContext {
    /// User the session belongs to.
    pub user_id: UserId,
}

impl SessionContext {
    /// Start a session for the given user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Waste categories a special pickup can be requested for.
pub enum WasteType {
    /// Metal scrap.
    Metal,
    /// Electrical and electronic appliances.
    Electrical,
    /// Paper.
    Paper,
    /// Cardboard, collected together with paper.
    Cardboard,
    /// Anything else. No schedule exists for it.
    Others,
    /// No category chosen yet.
    #[default]
    #[serde(rename = "")]
    Unselected,
}

impl WasteType {
    /// Every variant in the order they are offered to users.
    pub const ALL: [Self; 6] = [
        Self::Metal,
        Self::Electrical,
        Self::Paper,
        Self::Cardboard,
        Self::Others,
        Self::Unselected,
    ];

    /// Lowercase slug used on the wire.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Metal => "metal",
            Self::Electrical => "electrical",
            Self::Paper => "paper",
            Self::Cardboard => "cardboard",
            Self::Others => "others",
            Self::Unselected => "",
        }
    }

    /// Human-friendly label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Metal => "Metal",
            Self::Electrical => "Electrical",
            Self::Paper => "Paper",
            Self::Cardboard => "Cardboard",
            Self::Others => "Others",
            Self::Unselected => "Any type",
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.slug())
    }
}

impl FromStr for WasteType {
    type Err = PortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "metal" => Ok(Self::Metal),
            "electrical" => Ok(Self::Electrical),
            "paper" => Ok(Self::Paper),
            "cardboard" => Ok(Self::Cardboard),
            "others" => Ok(Self::Others),
            "" => Ok(Self::Unselected),
            _ => Err(PortError::UnknownWasteType(raw.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Set of days of the month on which a waste type is collected.
///
/// The backend still sends these as comma-separated text. Blank tokens,
/// tokens that are not numbers, and numbers outside `1..=31` are dropped;
/// duplicates collapse.
pub struct DateList(BTreeSet<Day>);

impl DateList {
    /// Parse the legacy comma-separated encoding. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| token.parse::<Day>().ok())
            .collect()
    }

    /// Days in ascending order.
    #[must_use]
    pub fn days(&self) -> &BTreeSet<Day> {
        &self.0
    }

    /// Whether the list contains the given day.
    #[must_use]
    pub fn contains(&self, day: Day) -> bool {
        self.0.contains(&day)
    }

    /// Whether no day is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Day> for DateList {
    fn from_iter<I: IntoIterator<Item = Day>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter(|day| (1..=MAX_DAY).contains(day))
                .collect(),
        )
    }
}

impl fmt::Display for DateList {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for day in &self.0 {
            if !first {
                formatter.write_str(",")?;
            }
            write!(formatter, "{day}")?;
            first = false;
        }
        Ok(())
    }
}

/// Wire shapes accepted for a date list: the legacy text or a native array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDateList {
    Legacy(String),
    Native(Vec<i64>),
}

impl<'de> Deserialize<'de> for DateList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawDateList>::deserialize(deserializer)?;
        Ok(match raw {
            None => Self::default(),
            Some(RawDateList::Legacy(text)) => Self::parse(&text),
            Some(RawDateList::Native(days)) => days
                .into_iter()
                .filter_map(|day| Day::try_from(day).ok())
                .collect(),
        })
    }
}

impl Serialize for DateList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Collection days of one route for the displayed month.
///
/// The record carries no month of its own; the consumer supplies it.
pub struct ScheduleRecord {
    /// Days on which metal is collected.
    #[serde(default)]
    pub metal_waste_dates: DateList,
    /// Days on which electrical waste is collected.
    #[serde(default)]
    pub electrical_waste_dates: DateList,
    /// Days on which paper and cardboard are collected.
    #[serde(default)]
    pub paper_waste_dates: DateList,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoute {
    #[serde(default)]
    route_id: Option<RouteId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfile {
    #[serde(default)]
    route: Option<RawRoute>,
    #[serde(default)]
    route_id: Option<RouteId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawProfile")]
/// The part of a user profile the pickup flow needs.
pub struct Profile {
    /// Route the user's address is assigned to, if any.
    pub route_id: Option<RouteId>,
}

impl From<RawProfile> for Profile {
    fn from(raw: RawProfile) -> Self {
        // The nested route object wins over the flat field.
        let route_id = raw.route.and_then(|route| route.route_id).or(raw.route_id);
        Self { route_id }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Processing state of a special pickup.
pub enum PickupStatus {
    /// Submitted, not yet handled.
    #[default]
    Pending,
    /// A crew is on it.
    InProgress,
    /// Collected.
    Completed,
    /// Status text the client does not know.
    Other(String),
}

impl From<String> for PickupStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Self::Pending,
            "in progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::Other(raw),
        }
    }
}

impl From<PickupStatus> for String {
    fn from(status: PickupStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => formatter.write_str("Pending"),
            Self::InProgress => formatter.write_str("In Progress"),
            Self::Completed => formatter.write_str("Completed"),
            Self::Other(raw) => formatter.write_str(raw),
        }
    }
}

fn number_or_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<NumberOrText>::deserialize(deserializer)?.map(String::from))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A special pickup as stored by the backend.
pub struct SpecialPickup {
    /// Backend identifier.
    #[serde(default)]
    pub pickup_id: Option<i64>,
    /// User who requested the pickup.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Waste type as free text; older records use values such as `plastic`.
    #[serde(default)]
    pub pickup_type: String,
    /// Free-form description.
    #[serde(default)]
    pub pickup_description: Option<String>,
    /// Estimated weight in kilograms.
    #[serde(default, deserialize_with = "number_or_text")]
    pub pickup_weight: Option<String>,
    /// Requested date, `YYYY-MM-DD` or a full timestamp.
    #[serde(default)]
    pub pickup_prefered_date: Option<String>,
    /// Image as a `data:` URL.
    #[serde(default)]
    pub pickup_image: Option<String>,
    /// Processing state.
    #[serde(default)]
    pub pickup_status: PickupStatus,
}

impl SpecialPickup {
    /// The waste type, when the stored text names a known one.
    #[must_use]
    pub fn waste_type(&self) -> Option<WasteType> {
        self.pickup_type.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Request body for creating a special pickup.
pub struct NewSpecialPickup {
    /// Requesting user.
    pub user_id: i64,
    /// Waste type.
    pub pickup_type: WasteType,
    /// Free-form description.
    pub pickup_description: String,
    /// Estimated weight as typed, in kilograms.
    pub pickup_weight: String,
    /// Accepted pickup date, `YYYY-MM-DD`.
    pub pickup_prefered_date: String,
    /// Base64 image payload without a `data:` prefix.
    pub pickup_image: Option<String>,
    /// Always [`PickupStatus::Pending`] for new requests.
    pub pickup_status: PickupStatus,
}
