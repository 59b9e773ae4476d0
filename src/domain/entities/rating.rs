//! Offering rating entity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

/// Highest score a rating can carry.
pub const MAX_SCORE: i32 = 5;

/// A user's rating of an offering.
///
/// Ratings hang off the offering id, so they follow the offering across
/// re-resolutions of its description and disappear with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub id: i64,
    pub offering_id: i64,
    pub user_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub rated_at: DateTime<Utc>,
}

/// Validated input for rating an offering.
#[derive(Debug, Clone, Validate)]
pub struct NewRating {
    #[validate(range(min = 0, max = 5))]
    pub score: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Partial rating update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateRating {
    #[validate(range(min = 0, max = 5))]
    pub score: Option<i32>,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

impl Rating {
    /// Applies the set fields of `update`.
    pub fn apply(&mut self, update: UpdateRating) {
        if let Some(score) = update.score {
            self.score = score;
        }
        if let Some(comment) = update.comment {
            self.comment = Some(comment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range() {
        let valid = NewRating {
            score: MAX_SCORE,
            comment: None,
        };
        assert!(valid.validate().is_ok());

        let too_high = NewRating {
            score: MAX_SCORE + 1,
            comment: None,
        };
        let errors = too_high.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("score"));

        let negative = UpdateRating {
            score: Some(-1),
            comment: None,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut rating = Rating {
            id: 1,
            offering_id: 2,
            user_id: 3,
            score: 4,
            comment: Some("Good".to_string()),
            rated_at: Utc::now(),
        };

        rating.apply(UpdateRating {
            score: Some(2),
            comment: None,
        });

        assert_eq!(rating.score, 2);
        assert_eq!(rating.comment.as_deref(), Some("Good"));
    }
}
