//! Assertions over the emails sent during a test.
//!
//! The checks in [`check`] work on any slice of [`CapturedMessage`]s and
//! return an [`AssertionError`] describing what went wrong. [`MailAssertions`]
//! wraps each of them for any [`CaptureSource`] and fails the calling test
//! instead.

use mailtrack_common::{CapturedMessage, Recipients};

use crate::{error::AssertionError, source::CaptureSource};

pub type Result<T> = std::result::Result<T, AssertionError>;

pub mod check {
    use super::{AssertionError, CapturedMessage, Recipients, Result};

    /// The most recently sent email, if any
    #[must_use]
    pub fn last_email(emails: &[CapturedMessage]) -> Option<&CapturedMessage> {
        emails.last()
    }

    pub fn none_sent(emails: &[CapturedMessage]) -> Result<()> {
        if emails.is_empty() {
            Ok(())
        } else {
            Err(AssertionError::UnexpectedEmails)
        }
    }

    pub fn count_sent(emails: &[CapturedMessage], expected: usize) -> Result<()> {
        if emails.len() == expected {
            Ok(())
        } else {
            Err(AssertionError::CountMismatch {
                expected,
                actual: emails.len(),
            })
        }
    }

    pub fn any_sent(emails: &[CapturedMessage]) -> Result<()> {
        if emails.is_empty() {
            Err(AssertionError::NoneSent)
        } else {
            Ok(())
        }
    }

    /// `message` when given, otherwise the last email; either way at least
    /// one email must have been sent.
    pub fn sent_email<'a>(
        emails: &'a [CapturedMessage],
        message: Option<&'a CapturedMessage>,
    ) -> Result<&'a CapturedMessage> {
        any_sent(emails)?;
        message
            .or_else(|| emails.last())
            .ok_or(AssertionError::NoneSent)
    }

    fn last(emails: &[CapturedMessage]) -> Result<&CapturedMessage> {
        sent_email(emails, None)
    }

    pub fn last_sent_to(emails: &[CapturedMessage], recipients: &Recipients) -> Result<()> {
        let last = last(emails)?;

        match recipients
            .iter()
            .find(|recipient| !last.recipients().contains(recipient))
        {
            Some(missing) => Err(AssertionError::NotSentTo(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn last_not_sent_to(emails: &[CapturedMessage], recipients: &Recipients) -> Result<()> {
        let last = last(emails)?;

        match recipients
            .iter()
            .find(|recipient| last.recipients().contains(recipient))
        {
            Some(present) => Err(AssertionError::SentTo(present.to_string())),
            None => Ok(()),
        }
    }

    pub fn last_subject_equals(emails: &[CapturedMessage], subject: &str) -> Result<()> {
        subject_equals(emails, subject, None)
    }

    pub fn last_body_contains(emails: &[CapturedMessage], excerpt: &str) -> Result<()> {
        if last(emails)?.body().contains(excerpt) {
            Ok(())
        } else {
            Err(AssertionError::ExcerptMissing(excerpt.to_string()))
        }
    }

    pub fn last_body_not_contains(emails: &[CapturedMessage], excerpt: &str) -> Result<()> {
        if last(emails)?.body().contains(excerpt) {
            Err(AssertionError::ExcerptPresent(excerpt.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn sent_to(
        emails: &[CapturedMessage],
        recipient: &str,
        message: Option<&CapturedMessage>,
    ) -> Result<()> {
        if sent_email(emails, message)?.recipients().contains(recipient) {
            Ok(())
        } else {
            Err(AssertionError::NotSentTo(recipient.to_string()))
        }
    }

    pub fn sent_from(
        emails: &[CapturedMessage],
        sender: &str,
        message: Option<&CapturedMessage>,
    ) -> Result<()> {
        if sent_email(emails, message)?.sender().contains(sender) {
            Ok(())
        } else {
            Err(AssertionError::NotSentFrom(sender.to_string()))
        }
    }

    pub fn body_equals(
        emails: &[CapturedMessage],
        body: &str,
        message: Option<&CapturedMessage>,
    ) -> Result<()> {
        if sent_email(emails, message)?.body() == body {
            Ok(())
        } else {
            Err(AssertionError::BodyMismatch)
        }
    }

    pub fn body_contains(
        emails: &[CapturedMessage],
        excerpt: &str,
        message: Option<&CapturedMessage>,
    ) -> Result<()> {
        if sent_email(emails, message)?.body().contains(excerpt) {
            Ok(())
        } else {
            Err(AssertionError::BodyNotFound)
        }
    }

    pub fn subject_equals(
        emails: &[CapturedMessage],
        subject: &str,
        message: Option<&CapturedMessage>,
    ) -> Result<()> {
        if sent_email(emails, message)?.subject() == subject {
            Ok(())
        } else {
            Err(AssertionError::SubjectMismatch(subject.to_string()))
        }
    }
}

/// Test assertions over a [`CaptureSource`].
///
/// Implemented for every capture source, including a test fixture that
/// implements [`CaptureSource`] by handing out its outbox:
///
/// ```
/// use mailtrack::{
///     CaptureSource, CapturedMessage, MailAssertions, Mailer, NullTransport, Outbox, SourceError,
/// };
///
/// struct SignUpTest {
///     mailer: Mailer,
///     outbox: Outbox,
/// }
///
/// impl CaptureSource for SignUpTest {
///     fn sent_emails(&self) -> Result<Vec<CapturedMessage>, SourceError> {
///         self.outbox.sent_emails()
///     }
/// }
///
/// let mut mailer = Mailer::new(NullTransport);
/// let outbox = Outbox::track(&mut mailer);
/// let test = SignUpTest { mailer, outbox };
///
/// test.assert_none_sent();
/// ```
///
/// Every assertion panics with a message describing the failure, at the
/// caller's location, and otherwise returns `self` so they can be chained.
pub trait MailAssertions: CaptureSource {
    #[track_caller]
    fn assert_that(&self, check: impl FnOnce(&[CapturedMessage]) -> Result<()>) -> &Self {
        let outcome = self
            .sent_emails()
            .map_err(AssertionError::from)
            .and_then(|emails| check(&emails));

        if let Err(err) = outcome {
            panic!("{err}");
        }

        self
    }

    /// The most recently sent email, or `None` if nothing was sent.
    #[track_caller]
    fn last_email(&self) -> Option<CapturedMessage> {
        match self.sent_emails() {
            Ok(mut emails) => emails.pop(),
            Err(err) => panic!("{}", AssertionError::from(err)),
        }
    }

    #[track_caller]
    fn assert_none_sent(&self) -> &Self {
        self.assert_that(check::none_sent)
    }

    #[track_caller]
    fn assert_count_sent(&self, count: usize) -> &Self {
        self.assert_that(|emails| check::count_sent(emails, count))
    }

    #[track_caller]
    fn assert_any_sent(&self) -> &Self {
        self.assert_that(check::any_sent)
    }

    /// Every one of `recipients` is in the last email's `To` header
    #[track_caller]
    fn assert_last_sent_to(&self, recipients: impl Into<Recipients>) -> &Self {
        let recipients = recipients.into();
        self.assert_that(|emails| check::last_sent_to(emails, &recipients))
    }

    /// None of `recipients` is in the last email's `To` header
    #[track_caller]
    fn assert_last_not_sent_to(&self, recipients: impl Into<Recipients>) -> &Self {
        let recipients = recipients.into();
        self.assert_that(|emails| check::last_not_sent_to(emails, &recipients))
    }

    #[track_caller]
    fn assert_last_subject_equals(&self, subject: &str) -> &Self {
        self.assert_that(|emails| check::last_subject_equals(emails, subject))
    }

    /// Case-sensitive search of the last email's decoded body
    #[track_caller]
    fn assert_last_body_contains(&self, excerpt: &str) -> &Self {
        self.assert_that(|emails| check::last_body_contains(emails, excerpt))
    }

    #[track_caller]
    fn assert_last_body_not_contains(&self, excerpt: &str) -> &Self {
        self.assert_that(|emails| check::last_body_not_contains(emails, excerpt))
    }

    #[track_caller]
    fn assert_sent_to(&self, recipient: &str, message: Option<&CapturedMessage>) -> &Self {
        self.assert_that(|emails| check::sent_to(emails, recipient, message))
    }

    #[track_caller]
    fn assert_sent_from(&self, sender: &str, message: Option<&CapturedMessage>) -> &Self {
        self.assert_that(|emails| check::sent_from(emails, sender, message))
    }

    #[track_caller]
    fn assert_body_equals(&self, body: &str, message: Option<&CapturedMessage>) -> &Self {
        self.assert_that(|emails| check::body_equals(emails, body, message))
    }

    #[track_caller]
    fn assert_body_contains(&self, excerpt: &str, message: Option<&CapturedMessage>) -> &Self {
        self.assert_that(|emails| check::body_contains(emails, excerpt, message))
    }

    #[track_caller]
    fn assert_subject_equals(&self, subject: &str, message: Option<&CapturedMessage>) -> &Self {
        self.assert_that(|emails| check::subject_equals(emails, subject, message))
    }
}

impl<T: CaptureSource + ?Sized> MailAssertions for T {}

#[cfg(test)]
mod tests {
    use mailtrack_common::{CapturedMessage, Recipients};
    use pretty_assertions::assert_eq;

    use super::check;
    use crate::error::AssertionError;

    fn email(to: &str, subject: &str, body: &str) -> CapturedMessage {
        CapturedMessage::parse(format!(
            "From: app@example.com\r\nTo: {to}\r\nSubject: {subject}\r\n\r\n{body}"
        ))
        .unwrap()
    }

    #[test]
    fn test_counts() {
        let emails = vec![email("a@x.com", "One", "1"), email("b@x.com", "Two", "2")];

        assert!(check::count_sent(&emails, 2).is_ok());
        assert_eq!(
            check::count_sent(&emails, 3),
            Err(AssertionError::CountMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert!(check::any_sent(&emails).is_ok());
        assert_eq!(check::none_sent(&emails), Err(AssertionError::UnexpectedEmails));
    }

    #[test]
    fn test_empty_outbox() {
        let emails: Vec<CapturedMessage> = Vec::new();

        assert!(check::none_sent(&emails).is_ok());
        assert!(check::count_sent(&emails, 0).is_ok());
        assert!(check::last_email(&emails).is_none());
        assert_eq!(check::any_sent(&emails), Err(AssertionError::NoneSent));
        assert_eq!(
            check::last_sent_to(&emails, &Recipients::from("a@x.com")),
            Err(AssertionError::NoneSent)
        );
        assert_eq!(
            check::last_not_sent_to(&emails, &Recipients::from("a@x.com")),
            Err(AssertionError::NoneSent)
        );
        assert_eq!(check::last_subject_equals(&emails, "Hi"), Err(AssertionError::NoneSent));
        assert_eq!(check::last_body_contains(&emails, "Hi"), Err(AssertionError::NoneSent));
        assert_eq!(check::last_body_not_contains(&emails, "Hi"), Err(AssertionError::NoneSent));
        assert_eq!(check::sent_from(&emails, "a@x.com", None), Err(AssertionError::NoneSent));
    }

    #[test]
    fn test_explicit_message_still_requires_a_send() {
        let other = email("a@x.com", "Hi", "Hello");

        assert_eq!(
            check::subject_equals(&[], "Hi", Some(&other)),
            Err(AssertionError::NoneSent)
        );
    }

    #[test]
    fn test_explicit_message_overrides_last() {
        let first = email("a@x.com", "One", "first body");
        let emails = vec![first.clone(), email("b@x.com", "Two", "second body")];

        assert!(check::sent_to(&emails, "a@x.com", Some(&first)).is_ok());
        assert!(check::subject_equals(&emails, "One", Some(&first)).is_ok());
        assert!(check::body_contains(&emails, "first", Some(&first)).is_ok());
        assert!(check::body_equals(&emails, "first body", Some(&first)).is_ok());

        assert_eq!(
            check::sent_to(&emails, "a@x.com", None),
            Err(AssertionError::NotSentTo("a@x.com".to_string()))
        );
        assert_eq!(
            check::subject_equals(&emails, "One", None),
            Err(AssertionError::SubjectMismatch("One".to_string()))
        );
        assert_eq!(
            check::body_contains(&emails, "first", None),
            Err(AssertionError::BodyNotFound)
        );
        assert_eq!(
            check::body_equals(&emails, "first body", None),
            Err(AssertionError::BodyMismatch)
        );
        assert!(check::sent_from(&emails, "app@example.com", None).is_ok());
        assert_eq!(
            check::sent_from(&emails, "b@x.com", None),
            Err(AssertionError::NotSentFrom("b@x.com".to_string()))
        );
    }

    #[test]
    fn test_sent_to_and_not_sent_to_are_exact_opposites() {
        let emails = vec![email("a@x.com, b@x.com", "Hi", "Hello")];

        for address in ["a@x.com", "b@x.com", "c@x.com", "A@x.com"] {
            let recipients = Recipients::from(address);
            assert_ne!(
                check::last_sent_to(&emails, &recipients).is_ok(),
                check::last_not_sent_to(&emails, &recipients).is_ok(),
                "{address}"
            );
        }
    }

    #[test]
    fn test_collection_of_recipients() {
        let emails = vec![email("a@x.com, b@x.com", "Hi", "Hello")];

        assert!(check::last_sent_to(&emails, &Recipients::from(["a@x.com", "b@x.com"])).is_ok());
        assert_eq!(
            check::last_sent_to(&emails, &Recipients::from(["a@x.com", "c@x.com"])),
            Err(AssertionError::NotSentTo("c@x.com".to_string()))
        );
        assert!(check::last_not_sent_to(&emails, &Recipients::from(["c@x.com", "d@x.com"])).is_ok());
        assert_eq!(
            check::last_not_sent_to(&emails, &Recipients::from(["c@x.com", "b@x.com"])),
            Err(AssertionError::SentTo("b@x.com".to_string()))
        );
    }

    #[test]
    fn test_body_checks_are_case_sensitive() {
        let emails = vec![email("a@x.com", "Hi", "Hello World")];

        assert!(check::last_body_contains(&emails, "Hello World").is_ok());
        assert_eq!(
            check::last_body_contains(&emails, "hello world"),
            Err(AssertionError::ExcerptMissing("hello world".to_string()))
        );
        assert!(check::last_body_not_contains(&emails, "hello world").is_ok());
        assert_eq!(
            check::last_body_not_contains(&emails, "World"),
            Err(AssertionError::ExcerptPresent("World".to_string()))
        );
    }
}
