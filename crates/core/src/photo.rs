//! Photo invariant and photo payload validation.
//!
//! A record may never carry more than [`MAX_PHOTOS_PER_RECORD`] photos in
//! total. The check counts photos already persisted plus the ones about to
//! be inserted; it never truncates the incoming list.

use serde::{Deserialize, Serialize};

use crate::error::EditDenial;

/// Maximum number of photos attached to one record.
pub const MAX_PHOTOS_PER_RECORD: i64 = 2;

/// Maximum length of a photo description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A photo submitted as part of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhoto {
    /// Encoded image payload (typically a `data:` URL).
    pub image_data: String,
    pub description: Option<String>,
}

/// A persisted photo row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: crate::types::DbId,
    pub record_id: crate::types::DbId,
    pub image_data: String,
    pub description: Option<String>,
}

/// Reject the edit if `existing + attempted` would exceed the per-record cap.
pub fn check_photo_capacity(existing: i64, attempted: i64) -> Result<(), EditDenial> {
    if existing + attempted > MAX_PHOTOS_PER_RECORD {
        return Err(EditDenial::PhotoLimitExceeded {
            current: existing,
            attempted,
            max: MAX_PHOTOS_PER_RECORD,
        });
    }
    Ok(())
}

/// Validate the shape of an edit's photo list.
pub fn validate_new_photos(photos: &[NewPhoto]) -> Result<(), String> {
    if photos.is_empty() {
        return Err("An edit must attach at least one photo".to_string());
    }
    for (idx, photo) in photos.iter().enumerate() {
        if photo.image_data.trim().is_empty() {
            return Err(format!("Photo {} has no image data", idx + 1));
        }
        if let Some(desc) = &photo.description {
            let len = desc.chars().count();
            if len > MAX_DESCRIPTION_LEN {
                return Err(format!(
                    "Photo {} description is {len} characters; maximum is {MAX_DESCRIPTION_LEN}",
                    idx + 1
                ));
            }
        }
    }
    Ok(())
}

/// Metadata recorded in the audit entry for the photos an edit attached.
///
/// Image bytes are never copied into the audit log.
pub fn photo_metadata(photos: &[NewPhoto]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = photos
        .iter()
        .map(|p| {
            serde_json::json!({
                "description": p.description,
                "size": p.image_data.len(),
            })
        })
        .collect();
    serde_json::json!({
        "count": photos.len(),
        "photos": items,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn photo(data: &str, description: Option<&str>) -> NewPhoto {
        NewPhoto {
            image_data: data.to_string(),
            description: description.map(str::to_string),
        }
    }

    // -----------------------------------------------------------------------
    // Capacity
    // -----------------------------------------------------------------------

    #[test]
    fn capacity_allows_up_to_the_cap() {
        assert!(check_photo_capacity(0, 2).is_ok());
        assert!(check_photo_capacity(1, 1).is_ok());
        assert!(check_photo_capacity(2, 0).is_ok());
    }

    #[test]
    fn capacity_rejects_overflow_with_counts() {
        assert_matches!(
            check_photo_capacity(1, 2),
            Err(EditDenial::PhotoLimitExceeded {
                current: 1,
                attempted: 2,
                max: 2
            })
        );
        assert!(check_photo_capacity(2, 1).is_err());
    }

    // -----------------------------------------------------------------------
    // Payload validation
    // -----------------------------------------------------------------------

    #[test]
    fn empty_photo_list_is_incomplete() {
        let err = validate_new_photos(&[]).unwrap_err();
        assert!(err.contains("at least one photo"));
    }

    #[test]
    fn blank_image_data_is_rejected() {
        let err = validate_new_photos(&[photo("data:image/png;base64,AA", None), photo("  ", None)])
            .unwrap_err();
        assert!(err.contains("Photo 2"));
    }

    #[test]
    fn overlong_description_is_rejected() {
        let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(validate_new_photos(&[photo("data:x", Some(&long))]).is_err());
        let ok = "x".repeat(MAX_DESCRIPTION_LEN);
        assert!(validate_new_photos(&[photo("data:x", Some(&ok))]).is_ok());
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    #[test]
    fn metadata_omits_image_bytes() {
        let meta = photo_metadata(&[photo("data:abc", Some("scratch on lid"))]);
        assert_eq!(meta["count"], 1);
        assert_eq!(meta["photos"][0]["description"], "scratch on lid");
        assert_eq!(meta["photos"][0]["size"], 8);
        assert!(!meta.to_string().contains("data:abc"));
    }
}
