//! Field validation for event payloads.
//!
//! Creation checks presence of every required field first, in declared order,
//! and only then value constraints. Updates check the constraints of the
//! fields they touch. Unknown fields are stored as given.

use evently_common::{
    EventStatus, CAPACITY, DATE, DESCRIPTION, DESCRIPTIONS, EVENT_ID, LOCATION, ORGANIZER,
    REQUIRED_FIELDS, STATUS, TITLE, TITLE_MAX_CHARS,
};
use evently_store::Item;
use serde_json::Value;

use super::error::ApiError;

/// Copy whichever description field is present into the other.
/// The canonical `descriptions` wins when both are set.
pub fn mirror_descriptions(fields: &mut Item) {
    let present = |fields: &Item, key: &str| fields.get(key).filter(|v| !v.is_null()).cloned();

    if let Some(value) = present(&*fields, DESCRIPTIONS) {
        fields.insert(DESCRIPTION.to_string(), value);
    } else if let Some(value) = present(&*fields, DESCRIPTION) {
        fields.insert(DESCRIPTIONS.to_string(), value);
    }
}

/// Validate a complete record before it is created.
pub fn validate_new_event(event: &Item) -> Result<(), ApiError> {
    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| event.get(**field).map_or(true, Value::is_null))
    {
        return Err(ApiError::validation(format!(
            "Missing required field: {missing}"
        )));
    }

    if let Some(id) = event.get(EVENT_ID) {
        check_field(EVENT_ID, id)?;
    }
    for field in REQUIRED_FIELDS {
        check_field(field, &event[field])?;
    }
    Ok(())
}

/// Reduce an update body to the fields that will be written: the key and
/// null-valued fields are dropped, descriptions are mirrored, and every
/// remaining known field is validated.
pub fn update_set(mut body: Item) -> Result<Item, ApiError> {
    body.remove(EVENT_ID);
    body.retain(|_, value| !value.is_null());
    if body.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    mirror_descriptions(&mut body);
    for (field, value) in &body {
        check_field(field, value)?;
    }
    Ok(body)
}

/// Value constraints for known fields. Unknown fields always pass.
pub fn check_field(field: &str, value: &Value) -> Result<(), ApiError> {
    let invalid = |reason: &str| -> Result<(), ApiError> {
        Err(ApiError::validation(format!(
            "Invalid field: {field} {reason}"
        )))
    };

    match field {
        TITLE => match value.as_str() {
            Some(title) if title.is_empty() => invalid("must be a non-empty string"),
            Some(title) if title.chars().count() > TITLE_MAX_CHARS => {
                invalid(&format!("must be at most {TITLE_MAX_CHARS} characters"))
            }
            Some(_) => Ok(()),
            None => invalid("must be a non-empty string"),
        },
        // The id is addressed as a single path segment.
        EVENT_ID => match value.as_str() {
            Some(id) if id.is_empty() => invalid("must be a non-empty string"),
            Some(id) if id.contains('/') => invalid("must not contain '/'"),
            Some(_) => Ok(()),
            None => invalid("must be a non-empty string"),
        },
        DESCRIPTIONS | DESCRIPTION | LOCATION | ORGANIZER => {
            match value.as_str() {
                Some(s) if !s.is_empty() => Ok(()),
                _ => invalid("must be a non-empty string"),
            }
        }
        DATE => match value {
            Value::String(_) => Ok(()),
            _ => invalid("must be a string"),
        },
        CAPACITY => match value.as_i64() {
            Some(capacity) if capacity > 0 => Ok(()),
            _ => invalid("must be a positive integer"),
        },
        STATUS => match value.as_str().map(str::parse::<EventStatus>) {
            Some(Ok(_)) => Ok(()),
            _ => invalid("must be one of active, cancelled, completed"),
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn valid_event() -> Item {
        item(json!({
            "eventId": "e1",
            "title": "Launch",
            "descriptions": "Product launch",
            "date": "2026-05-01",
            "location": "Hall A",
            "capacity": 100,
            "organizer": "Ada",
            "status": "active"
        }))
    }

    #[test]
    fn mirror_fills_canonical_from_synonym() {
        let mut fields = item(json!({"description": "x"}));
        mirror_descriptions(&mut fields);
        assert_eq!(fields["descriptions"], json!("x"));
        assert_eq!(fields["description"], json!("x"));
    }

    #[test]
    fn mirror_fills_synonym_from_canonical() {
        let mut fields = item(json!({"descriptions": "y"}));
        mirror_descriptions(&mut fields);
        assert_eq!(fields["description"], json!("y"));
    }

    #[test]
    fn mirror_prefers_canonical_when_both_differ() {
        let mut fields = item(json!({"descriptions": "canonical", "description": "synonym"}));
        mirror_descriptions(&mut fields);
        assert_eq!(fields["description"], json!("canonical"));
        assert_eq!(fields["descriptions"], json!("canonical"));
    }

    #[test]
    fn mirror_leaves_fields_without_descriptions_alone() {
        let mut fields = item(json!({"title": "t"}));
        mirror_descriptions(&mut fields);
        assert_eq!(fields, item(json!({"title": "t"})));
    }

    #[test]
    fn valid_event_passes() {
        let mut event = valid_event();
        mirror_descriptions(&mut event);
        assert!(validate_new_event(&event).is_ok());
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut event = valid_event();
        event.remove("date");
        event.remove("organizer");
        let err = validate_new_event(&event).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: date");
    }

    #[test]
    fn null_counts_as_missing() {
        let mut event = valid_event();
        event.insert("capacity".into(), Value::Null);
        let err = validate_new_event(&event).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: capacity");
    }

    #[test]
    fn presence_is_checked_before_constraints() {
        let mut event = valid_event();
        event.insert("title".into(), json!(""));
        event.remove("status");
        let err = validate_new_event(&event).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: status");
    }

    #[test]
    fn capacity_must_be_positive_integer() {
        for bad in [json!(0), json!(-3), json!(2.5), json!("10"), json!(true)] {
            let err = check_field("capacity", &bad).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid field: capacity must be a positive integer"
            );
        }
        assert!(check_field("capacity", &json!(1)).is_ok());
    }

    #[test]
    fn status_must_be_enumerated() {
        assert!(check_field("status", &json!("completed")).is_ok());
        for bad in [json!("Active"), json!("archived"), json!(1)] {
            assert!(check_field("status", &bad).is_err());
        }
    }

    #[test]
    fn title_length_is_bounded() {
        let long = "x".repeat(201);
        let err = check_field("title", &json!(long)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid field: title must be at most 200 characters"
        );
        assert!(check_field("title", &json!("x".repeat(200))).is_ok());
    }

    #[test]
    fn date_only_needs_to_be_a_string() {
        assert!(check_field("date", &json!("next tuesday")).is_ok());
        assert!(check_field("date", &json!(20260501)).is_err());
    }

    #[test]
    fn event_id_must_fit_in_one_path_segment() {
        assert!(check_field("eventId", &json!("spring fair")).is_ok());
        let err = check_field("eventId", &json!("fairs/spring")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid field: eventId must not contain '/'");

        let mut event = valid_event();
        event.insert("eventId".into(), json!("a/b"));
        assert!(validate_new_event(&event).is_err());
    }

    #[test]
    fn unknown_fields_pass() {
        assert!(check_field("order", &json!(null)).is_ok());
        assert!(check_field("tags", &json!(["a"])).is_ok());
    }

    #[test]
    fn update_set_drops_key_and_nulls() {
        let err = update_set(item(json!({"eventId": "x", "otherField": null}))).unwrap_err();
        assert_eq!(err.to_string(), "No fields to update");
    }

    #[test]
    fn update_set_keeps_touched_fields_only() {
        let set = update_set(item(json!({"title": "New", "location": null, "eventId": "e9"})))
            .unwrap();
        assert_eq!(set, item(json!({"title": "New"})));
    }

    #[test]
    fn update_set_mirrors_descriptions() {
        let set = update_set(item(json!({"description": "d"}))).unwrap();
        assert_eq!(set, item(json!({"description": "d", "descriptions": "d"})));
    }

    #[test]
    fn update_set_validates_touched_fields() {
        let err = update_set(item(json!({"capacity": 0}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid field: capacity must be a positive integer"
        );
    }
}
