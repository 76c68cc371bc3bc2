use std::{
    fmt::{self, Display},
    ops::Deref,
};

use mailparse::{MailAddr, MailAddrList, SingleInfo};

/// A single address with its (optional) display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mailbox {
    pub address: String,
    pub display_name: Option<String>,
}

impl Mailbox {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

impl From<&SingleInfo> for Mailbox {
    fn from(value: &SingleInfo) -> Self {
        Self {
            address: value.addr.clone(),
            display_name: value.display_name.clone(),
        }
    }
}

/// Ordered address -> display name mapping, as found in a `From`, `To` or
/// `Cc` header.
///
/// Lookups are exact on the address, so `someone@example.com` and
/// `Someone@example.com` are different keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressMap(Vec<Mailbox>);

impl AddressMap {
    /// Returns `true` if `address` is a key of this mapping
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.0.iter().any(|mailbox| mailbox.address == address)
    }

    /// The display name registered for `address`, if there is one
    #[must_use]
    pub fn display_name(&self, address: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|mailbox| mailbox.address == address)
            .and_then(|mailbox| mailbox.display_name.as_deref())
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|mailbox| mailbox.address.as_str())
    }
}

impl Display for AddressMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mailbox) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            Display::fmt(mailbox, f)?;
        }
        Ok(())
    }
}

impl Deref for AddressMap {
    type Target = Vec<Mailbox>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Mailbox>> for AddressMap {
    fn from(value: Vec<Mailbox>) -> Self {
        Self(value)
    }
}

impl From<&MailAddrList> for AddressMap {
    /// Groups are flattened into their members.
    fn from(value: &MailAddrList) -> Self {
        Self(
            value
                .iter()
                .flat_map(|addr| match addr {
                    MailAddr::Single(single) => vec![Mailbox::from(single)],
                    MailAddr::Group(group) => group.addrs.iter().map(Mailbox::from).collect(),
                })
                .collect(),
        )
    }
}

/// Addresses handed to a recipient assertion.
///
/// Assertions accept either a single address or a collection of them; both
/// are normalised into this type before any comparison runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Recipients {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<&String> for Recipients {
    fn from(value: &String) -> Self {
        Self(vec![value.clone()])
    }
}

impl<S: AsRef<str>> From<&[S]> for Recipients {
    fn from(value: &[S]) -> Self {
        Self(value.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for Recipients {
    fn from(value: [S; N]) -> Self {
        Self(value.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>> From<Vec<S>> for Recipients {
    fn from(value: Vec<S>) -> Self {
        Self(value.iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
