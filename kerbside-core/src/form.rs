//! Special pickup request form and its field rules.

use std::fmt;

use chrono::NaiveDate;

use crate::calendar::PickupDateUpdate;
use crate::model::{NewSpecialPickup, PickupStatus, SessionContext, WasteType};
use crate::ports::PortError;

/// Longest description accepted, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;
/// Heaviest pickup accepted, in kilograms.
pub const MAX_WEIGHT_KG: f64 = 1000.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fields of the pickup form.
pub enum FormField {
    /// Waste type.
    WasteType,
    /// Requested pickup date.
    PickupDate,
    /// Free-form description.
    Description,
    /// Estimated weight.
    Weight,
}

impl fmt::Display for FormField {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::WasteType => "Waste Type",
            Self::PickupDate => "Pickup Date",
            Self::Description => "Description",
            Self::Weight => "Weight",
        };
        formatter.write_str(label)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// A single field that failed validation.
pub enum FieldError {
    /// Field left empty.
    #[error("{0} is required")]
    Required(FormField),
    /// Pickup date is not a `YYYY-MM-DD` date.
    #[error("Pickup Date is not a valid date")]
    InvalidDate,
    /// Pickup date is today or earlier.
    #[error("Date must be in the future")]
    PastDate,
    /// Description is too long.
    #[error("Description cannot exceed 500 characters")]
    DescriptionTooLong,
    /// Weight is not a number.
    #[error("Weight must be a number")]
    WeightNotNumber,
    /// Weight is negative.
    #[error("Weight must be greater than 0")]
    WeightTooLight,
    /// Weight is above the limit.
    #[error("Weight cannot exceed 1000 kg")]
    WeightTooHeavy,
}

impl FieldError {
    /// The field the error belongs to.
    #[must_use]
    pub fn field(&self) -> FormField {
        match self {
            Self::Required(field) => *field,
            Self::InvalidDate | Self::PastDate => FormField::PickupDate,
            Self::DescriptionTooLong => FormField::Description,
            Self::WeightNotNumber | Self::WeightTooLight | Self::WeightTooHeavy => FormField::Weight,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Values of a special pickup request being filled in.
pub struct PickupForm {
    /// Chosen waste type.
    pub waste_type: WasteType,
    /// Accepted date, `YYYY-MM-DD`, empty until a calendar day is accepted.
    pub pickup_date: String,
    /// Free-form description.
    pub description: String,
    /// Estimated weight in kilograms as typed, empty when unknown.
    pub weight: String,
    /// Base64 image payload.
    pub image: Option<String>,
}

impl PickupForm {
    /// An empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a date accepted on the calendar together with its waste type.
    pub fn apply_date(&mut self, update: &PickupDateUpdate) {
        self.pickup_date.clone_from(&update.pickup_date);
        self.waste_type = update.waste_type;
    }

    /// Attach an image, stripping a `data:…;base64,` prefix if present.
    pub fn set_image(&mut self, encoded: &str) {
        let payload = encoded
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .map_or(encoded, |(_, payload)| payload);
        self.image = Some(payload.to_owned()).filter(|payload| !payload.is_empty());
    }

    /// Parsed pickup date, `None` while the field is empty.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Parse`] when the field holds something other than `YYYY-MM-DD`.
    pub fn pickup_date(&self) -> Result<Option<NaiveDate>, PortError> {
        let raw = self.pickup_date.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(NaiveDate::parse_from_str(raw, DATE_FORMAT)?))
    }

    /// Parsed weight, `None` while the field is empty.
    ///
    /// # Errors
    ///
    /// Returns a weight [`FieldError`] for text that is not a number in `0..=1000`.
    pub fn weight_kg(&self) -> Result<Option<f64>, FieldError> {
        let raw = self.weight.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let weight = raw
            .parse::<f64>()
            .ok()
            .filter(|weight| weight.is_finite())
            .ok_or(FieldError::WeightNotNumber)?;
        if weight < 0.0 {
            Err(FieldError::WeightTooLight)
        } else if weight > MAX_WEIGHT_KG {
            Err(FieldError::WeightTooHeavy)
        } else {
            Ok(Some(weight))
        }
    }

    /// Check every field; the date must lie after `today`.
    ///
    /// # Errors
    ///
    /// Returns all failing fields at once.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.waste_type == WasteType::Unselected {
            errors.push(FieldError::Required(FormField::WasteType));
        }

        match self.pickup_date() {
            Ok(None) => errors.push(FieldError::Required(FormField::PickupDate)),
            Ok(Some(date)) if date <= today => errors.push(FieldError::PastDate),
            Ok(Some(_)) => {}
            Err(_) => errors.push(FieldError::InvalidDate),
        }

        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.push(FieldError::DescriptionTooLong);
        }

        if let Err(err) = self.weight_kg() {
            errors.push(err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Build the creation request for `session`.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidForm`] when validation fails and
    /// [`PortError::InvalidUserId`] when the session's user id is not numeric.
    pub fn to_request(
        &self,
        session: &SessionContext,
        today: NaiveDate,
    ) -> Result<NewSpecialPickup, PortError> {
        self.validate(today).map_err(PortError::InvalidForm)?;

        let user_id = session
            .user_id
            .0
            .trim()
            .parse::<i64>()
            .map_err(|_err| PortError::InvalidUserId)?;

        Ok(NewSpecialPickup {
            user_id,
            pickup_type: self.waste_type,
            pickup_description: self.description.trim().to_owned(),
            pickup_weight: self.weight.trim().to_owned(),
            pickup_prefered_date: self.pickup_date.trim().to_owned(),
            pickup_image: self.image.clone(),
            pickup_status: PickupStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date")
    }

    fn filled() -> PickupForm {
        PickupForm {
            waste_type: WasteType::Metal,
            pickup_date: "2024-06-05".to_owned(),
            description: "Old bicycle frame".to_owned(),
            weight: "12.5".to_owned(),
            image: None,
        }
    }

    #[test]
    fn empty_form_reports_required_fields() {
        let errors = PickupForm::new().validate(today()).expect_err("empty form");
        assert_eq!(
            errors,
            vec![
                FieldError::Required(FormField::WasteType),
                FieldError::Required(FormField::PickupDate)
            ],
            "type and date are required"
        );
        assert_eq!(errors.first().map(ToString::to_string).as_deref(), Some("Waste Type is required"), "message");
    }

    #[test]
    fn date_must_be_after_today() {
        let mut form = filled();
        form.pickup_date = "2024-06-03".to_owned();
        assert_eq!(form.validate(today()), Err(vec![FieldError::PastDate]), "today is too early");

        form.pickup_date = "June 5th".to_owned();
        assert_eq!(form.validate(today()), Err(vec![FieldError::InvalidDate]), "unparseable");
    }

    #[test]
    fn weight_and_description_limits() {
        let mut form = filled();
        form.weight = "1000.5".to_owned();
        form.description = "x".repeat(MAX_DESCRIPTION_CHARS + 1);
        let errors = form.validate(today()).expect_err("two problems");
        assert_eq!(errors, vec![FieldError::DescriptionTooLong, FieldError::WeightTooHeavy], "both");
        assert_eq!(errors.last().map(FieldError::field), Some(FormField::Weight), "field");

        form.description.clear();
        form.weight = "-1".to_owned();
        assert_eq!(form.validate(today()), Err(vec![FieldError::WeightTooLight]), "negative");
        form.weight = "NaN".to_owned();
        assert_eq!(form.validate(today()), Err(vec![FieldError::WeightNotNumber]), "not finite");
        form.weight = String::new();
        assert_eq!(form.validate(today()), Ok(()), "weight is optional");
    }

    #[test]
    fn request_carries_pending_status_and_numeric_user() {
        let session = SessionContext::new(UserId("42".to_owned()));
        let request = filled().to_request(&session, today()).expect("valid form");
        assert_eq!(request.user_id, 42, "numeric user");
        assert_eq!(request.pickup_status, PickupStatus::Pending, "pending");
        assert_eq!(request.pickup_prefered_date, "2024-06-05", "date");

        let json = serde_json::to_value(&request).expect("serializable");
        assert_eq!(json["pickupType"], "metal", "wire slug");
        assert_eq!(json["pickupStatus"], "Pending", "wire status");

        let stranger = SessionContext::new(UserId("guest".to_owned()));
        assert!(
            matches!(filled().to_request(&stranger, today()), Err(PortError::InvalidUserId)),
            "non-numeric user"
        );
        assert!(
            matches!(PickupForm::new().to_request(&session, today()), Err(PortError::InvalidForm(errors)) if errors.len() == 2),
            "invalid form"
        );
    }

    #[test]
    fn image_prefix_is_stripped() {
        let mut form = PickupForm::new();
        form.set_image("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(form.image.as_deref(), Some("iVBORw0KGgo="), "prefix stripped");
        form.set_image("iVBORw0KGgo=");
        assert_eq!(form.image.as_deref(), Some("iVBORw0KGgo="), "raw payload kept");
        form.set_image("");
        assert_eq!(form.image, None, "empty clears");
    }
}
