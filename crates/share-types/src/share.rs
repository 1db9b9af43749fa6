use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a share, serialized on the wire by its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    User,
    Group,
    Link,
    Remote,
}

impl ShareType {
    pub const ALL: [ShareType; 4] = [Self::User, Self::Group, Self::Link, Self::Remote];

    pub fn code(&self) -> u8 {
        match self {
            Self::User => 0,
            Self::Group => 1,
            Self::Link => 3,
            Self::Remote => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.code() == code)
    }
}

impl fmt::Display for ShareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Link => "link",
            Self::Remote => "remote",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareRecord {
    pub node_id: NodeId,
    pub share_type: ShareType,
}

/// Distinct share types in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareTypeList(Vec<ShareType>);

impl ShareTypeList {
    pub fn insert(&mut self, share_type: ShareType) -> bool {
        if self.0.contains(&share_type) {
            return false;
        }
        self.0.push(share_type);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn codes(&self) -> Vec<u8> {
        self.0.iter().map(ShareType::code).collect()
    }

    pub fn as_slice(&self) -> &[ShareType] {
        &self.0
    }
}

impl FromIterator<ShareType> for ShareTypeList {
    fn from_iter<I: IntoIterator<Item = ShareType>>(iter: I) -> Self {
        let mut list = Self::default();
        for share_type in iter {
            list.insert(share_type);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::{ShareType, ShareTypeList};
    use rstest::rstest;

    #[rstest]
    #[case::user(ShareType::User, 0)]
    #[case::group(ShareType::Group, 1)]
    #[case::link(ShareType::Link, 3)]
    #[case::remote(ShareType::Remote, 6)]
    fn wire_codes(#[case] share_type: ShareType, #[case] code: u8) {
        assert_eq!(share_type.code(), code);
        assert_eq!(ShareType::from_code(code), Some(share_type));
    }

    #[test]
    fn unknown_code() {
        assert_eq!(ShareType::from_code(2), None);
    }

    #[test]
    fn list_keeps_first_insertion_order() {
        let list: ShareTypeList = [
            ShareType::Link,
            ShareType::Group,
            ShareType::Link,
            ShareType::Group,
        ]
        .into_iter()
        .collect();
        assert_eq!(list.as_slice(), &[ShareType::Link, ShareType::Group]);
        assert_eq!(list.codes(), vec![3, 1]);
    }
}
