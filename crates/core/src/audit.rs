//! Audit metadata carried by every domain record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Who created/last modified a record, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub modified_by: UserId,
    pub modified_at: DateTime<Utc>,
}

impl AuditStamp {
    /// Stamp a freshly created record; all four fields start from the same
    /// actor and instant.
    pub fn new(actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            created_by: actor,
            created_at: at,
            modified_by: actor,
            modified_at: at,
        }
    }

    /// Refresh the modified pair. The created pair never changes.
    pub fn touch(&mut self, actor: UserId, at: DateTime<Utc>) {
        self.modified_by = actor;
        self.modified_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn touch_refreshes_only_the_modified_pair() {
        let creator = UserId::new();
        let editor = UserId::new();
        let mut stamp = AuditStamp::new(creator, at(100));

        stamp.touch(editor, at(200));

        assert_eq!(stamp.created_by, creator);
        assert_eq!(stamp.created_at, at(100));
        assert_eq!(stamp.modified_by, editor);
        assert_eq!(stamp.modified_at, at(200));
    }
}
