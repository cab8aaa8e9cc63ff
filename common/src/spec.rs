use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ethereum hardforks, ordered by activation.
///
/// Rules are cumulative: a fork enables everything its predecessors enabled,
/// so comparisons go through [`SpecId::is_enabled_in`].
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString,
    Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum SpecId {
    FRONTIER = 0,
    FRONTIER_THAWING = 1,
    HOMESTEAD = 2,
    DAO_FORK = 3,
    TANGERINE = 4,
    SPURIOUS_DRAGON = 5,
    BYZANTIUM = 6,
    CONSTANTINOPLE = 7,
    PETERSBURG = 8,
    ISTANBUL = 9,
    MUIR_GLACIER = 10,
    BERLIN = 11,
    LONDON = 12,
    ARROW_GLACIER = 13,
    GRAY_GLACIER = 14,
    #[strum(to_string = "MERGE", serialize = "PARIS")]
    MERGE = 15,
    SHANGHAI = 16,
    CANCUN = 17,
    PRAGUE = 18,
    #[default]
    LATEST = u8::MAX,
}

impl SpecId {
    /// Returns `true` if the rules of `other` are active under `self`.
    #[inline]
    pub const fn is_enabled_in(self, other: SpecId) -> bool {
        self as u8 >= other as u8
    }

    /// EIP-2929 cold/warm access accounting.
    pub const fn has_access_lists(self) -> bool {
        self.is_enabled_in(SpecId::BERLIN)
    }

    /// EIP-161 removal of touched empty accounts.
    pub const fn clears_empty_accounts(self) -> bool {
        self.is_enabled_in(SpecId::SPURIOUS_DRAGON)
    }

    /// EIP-1153 transient storage.
    pub const fn has_transient_storage(self) -> bool {
        self.is_enabled_in(SpecId::CANCUN)
    }
}

impl TryFrom<String> for SpecId {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SpecId::from_str(&value)
    }
}

impl From<SpecId> for String {
    fn from(spec: SpecId) -> Self {
        spec.to_string()
    }
}
