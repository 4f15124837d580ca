//! Action-dispatch policy.
//!
//! Maps a classification to exactly one [`TriageAction`]. Rows are checked
//! top to bottom and the first match wins:
//!
//! | # | Condition                                              | Action             |
//! |---|--------------------------------------------------------|--------------------|
//! | 1 | suggests `Reply` and carries a non-blank draft         | Draft Created      |
//! | 2 | suggests `Digest`, or category is Newsletter/Informational/Finance | Added to Digest |
//! | 3 | suggests `Archive`                                     | Archived           |
//! | 4 | suggests `Trash` and category is OTP                   | Schedule for Trash |
//! | 5 | suggests `Trash`                                       | Trashed            |
//! | - | anything else                                          | None               |

use serde::{Serialize, Serializer};

use super::model::{Category, Classification, SuggestedAction};

/// The single mailbox action taken for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriageAction {
    /// A reply draft was created.
    DraftCreated,
    /// The message went into this scan's digest.
    AddedToDigest,
    /// The message was archived.
    Archived,
    /// The message was queued for delayed trashing.
    ScheduledForTrash,
    /// The message was trashed immediately.
    Trashed,
    /// Nothing was done.
    NoAction,
}

impl TriageAction {
    /// Label reported in scan results.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DraftCreated => "Draft Created",
            Self::AddedToDigest => "Added to Digest",
            Self::Archived => "Archived",
            Self::ScheduledForTrash => "Schedule for Trash",
            Self::Trashed => "Trashed",
            Self::NoAction => "None",
        }
    }
}

impl std::fmt::Display for TriageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TriageAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Pick the action for a classification.
#[must_use]
pub fn decide(classification: &Classification) -> TriageAction {
    let has_draft = classification.draft().is_some();

    match (classification.suggested_action, &classification.category) {
        (SuggestedAction::Reply, _) if has_draft => TriageAction::DraftCreated,
        (SuggestedAction::Digest, _) => TriageAction::AddedToDigest,
        (_, category) if category.is_digest_worthy() => TriageAction::AddedToDigest,
        (SuggestedAction::Archive, _) => TriageAction::Archived,
        (SuggestedAction::Trash, Category::Otp) => TriageAction::ScheduledForTrash,
        (SuggestedAction::Trash, _) => TriageAction::Trashed,
        _ => TriageAction::NoAction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classification(category: Category, action: SuggestedAction) -> Classification {
        Classification::new(category, action)
    }

    #[test]
    fn test_reply_with_draft() {
        let c = classification(Category::Work, SuggestedAction::Reply).with_draft_reply("Sure.");
        assert_eq!(decide(&c), TriageAction::DraftCreated);
    }

    #[test]
    fn test_reply_without_draft_degrades() {
        let c = classification(Category::Work, SuggestedAction::Reply);
        assert_eq!(decide(&c), TriageAction::NoAction);

        let blank = classification(Category::Work, SuggestedAction::Reply).with_draft_reply("  ");
        assert_eq!(decide(&blank), TriageAction::NoAction);
    }

    #[test]
    fn test_reply_beats_digest_category() {
        let c = classification(Category::Newsletter, SuggestedAction::Reply)
            .with_draft_reply("Please unsubscribe me.");
        assert_eq!(decide(&c), TriageAction::DraftCreated);
    }

    #[test]
    fn test_digest_routes() {
        for category in [
            Category::Newsletter,
            Category::Informational,
            Category::Finance,
        ] {
            let c = classification(category, SuggestedAction::Archive);
            assert_eq!(decide(&c), TriageAction::AddedToDigest);
        }

        let c = classification(Category::Personal, SuggestedAction::Digest);
        assert_eq!(decide(&c), TriageAction::AddedToDigest);
    }

    #[test]
    fn test_archive() {
        let c = classification(Category::Work, SuggestedAction::Archive);
        assert_eq!(decide(&c), TriageAction::Archived);
    }

    #[test]
    fn test_otp_trash_is_deferred() {
        let c = classification(Category::Otp, SuggestedAction::Trash);
        assert_eq!(decide(&c), TriageAction::ScheduledForTrash);

        let spam = classification(Category::Spam, SuggestedAction::Trash);
        assert_eq!(decide(&spam), TriageAction::Trashed);
    }

    #[test]
    fn test_finance_trash_goes_to_digest() {
        let c = classification(Category::Finance, SuggestedAction::Trash);
        assert_eq!(decide(&c), TriageAction::AddedToDigest);
    }

    #[test]
    fn test_fallthrough() {
        for action in [SuggestedAction::MarkAsRead, SuggestedAction::Flag] {
            let c = classification(Category::Personal, action);
            assert_eq!(decide(&c), TriageAction::NoAction);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(TriageAction::ScheduledForTrash.to_string(), "Schedule for Trash");
        assert_eq!(
            serde_json::to_value(TriageAction::NoAction).ok(),
            Some(serde_json::json!("None"))
        );
    }

    fn any_category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Work),
            Just(Category::Personal),
            Just(Category::Spam),
            Just(Category::Newsletter),
            Just(Category::Finance),
            Just(Category::Informational),
            Just(Category::Otp),
            "[a-z]{1,8}".prop_map(|s| Category::parse(&s)),
        ]
    }

    fn any_classification() -> impl Strategy<Value = Classification> {
        (
            any_category(),
            proptest::sample::select(SuggestedAction::ALL.to_vec()),
            proptest::option::of("[a-z ]{0,12}"),
        )
            .prop_map(|(category, action, draft)| Classification {
                draft_reply: draft,
                ..Classification::new(category, action)
            })
    }

    type Row = (fn(&Classification) -> bool, TriageAction);

    /// The policy table as independent predicates, in priority order.
    fn rows() -> [Row; 5] {
        [
            (
                |c: &Classification| {
                    c.suggested_action == SuggestedAction::Reply && c.draft().is_some()
                },
                TriageAction::DraftCreated,
            ),
            (
                |c: &Classification| {
                    c.suggested_action == SuggestedAction::Digest
                        || matches!(
                            c.category,
                            Category::Newsletter | Category::Informational | Category::Finance
                        )
                },
                TriageAction::AddedToDigest,
            ),
            (
                |c: &Classification| c.suggested_action == SuggestedAction::Archive,
                TriageAction::Archived,
            ),
            (
                |c: &Classification| {
                    c.suggested_action == SuggestedAction::Trash && c.category == Category::Otp
                },
                TriageAction::ScheduledForTrash,
            ),
            (
                |c: &Classification| c.suggested_action == SuggestedAction::Trash,
                TriageAction::Trashed,
            ),
        ]
    }

    proptest! {
        #[test]
        fn prop_first_matching_row_wins(c in any_classification()) {
            let expected = rows()
                .into_iter()
                .find(|(matches, _)| matches(&c))
                .map_or(TriageAction::NoAction, |(_, action)| action);
            prop_assert_eq!(decide(&c), expected);
        }

        #[test]
        fn prop_reply_with_draft_always_drafts(c in any_classification(), draft in "[a-z]{1,12}") {
            let c = Classification {
                suggested_action: SuggestedAction::Reply,
                draft_reply: Some(draft),
                ..c
            };
            prop_assert_eq!(decide(&c), TriageAction::DraftCreated);
        }

        #[test]
        fn prop_otp_never_trashed_immediately(c in any_classification()) {
            let c = Classification { category: Category::Otp, ..c };
            prop_assert_ne!(decide(&c), TriageAction::Trashed);
        }
    }
}
