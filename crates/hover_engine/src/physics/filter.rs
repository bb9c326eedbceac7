//! Identity tokens carried through the solver's per-shape filter data
//!
//! The solver only stores four 32-bit words per shape. Game objects are
//! identified by an arena key, whose 64 raw bits are spread over the words
//! lowest word first. Unused words are zero. An all-zero token means the
//! shape has no game object counterpart.

use bitflags::bitflags;
use slotmap::{Key, KeyData};

use super::object::ObjectKey;

/// Number of 32-bit words of filter data per shape
pub const FILTER_WORDS: usize = 4;

/// Opaque identity token stored in a shape's filter data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterToken {
    words: [u32; FILTER_WORDS],
}

impl FilterToken {
    /// Token of shapes without game object
    pub const EMPTY: Self = Self { words: [0; FILTER_WORDS] };

    /// Encode an object key
    pub fn encode(key: ObjectKey) -> Self {
        if key.is_null() {
            return Self::EMPTY;
        }
        Self::from_raw(key.data().as_ffi())
    }

    /// Decode the object key, `None` for the empty token
    pub fn decode(&self) -> Option<ObjectKey> {
        if self.is_empty() {
            return None;
        }
        Some(KeyData::from_ffi(self.to_raw()).into())
    }

    /// Spread raw identity bits over the words, lowest word first
    pub fn from_raw(raw: u64) -> Self {
        let mut words = [0; FILTER_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            // shifts past the identity width leave the word zeroed
            let shifted = u32::try_from(index * 32)
                .ok()
                .and_then(|shift| raw.checked_shr(shift))
                .unwrap_or(0);
            *word = u32::try_from(shifted & 0xffff_ffff).unwrap_or(0);
        }
        Self { words }
    }

    /// Gather the raw identity bits back from the words
    pub fn to_raw(&self) -> u64 {
        self.words.iter().enumerate().fold(0_u64, |raw, (index, &word)| {
            let shifted = u32::try_from(index * 32)
                .ok()
                .and_then(|shift| u64::from(word).checked_shl(shift))
                .unwrap_or(0);
            raw | shifted
        })
    }

    /// Build a token from the solver's words
    pub const fn from_words(words: [u32; FILTER_WORDS]) -> Self {
        Self { words }
    }

    /// Words handed to the solver
    pub const fn words(&self) -> [u32; FILTER_WORDS] {
        self.words
    }

    /// Whether the shape has no game object counterpart
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }
}

bitflags! {
    /// Contact processing requested for a kept pair
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PairFlags: u32 {
        /// Generate contacts and resolve them
        const CONTACT_DEFAULT = 1 << 0;
        /// Report the first contact of the pair
        const NOTIFY_TOUCH_FOUND = 1 << 1;
        /// Report contact points
        const NOTIFY_CONTACT_POINTS = 1 << 2;
        /// Let the game modify contacts before solving
        const MODIFY_CONTACTS = 1 << 3;
    }
}

impl PairFlags {
    /// Full response plus every notification
    pub const DEFAULT_RESPONSE: Self = Self::CONTACT_DEFAULT
        .union(Self::NOTIFY_TOUCH_FOUND)
        .union(Self::NOTIFY_CONTACT_POINTS)
        .union(Self::MODIFY_CONTACTS);
}

/// Verdict of the contact filter for a pair of shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Drop the pair, no contact and no event from the solver
    Kill,
    /// Process the pair with the given flags
    Keep(PairFlags),
}

impl FilterDecision {
    /// Whether the pair was dropped
    pub fn is_killed(self) -> bool {
        self == Self::Kill
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_object_key_roundtrip() {
        let mut arena: SlotMap<ObjectKey, u32> = SlotMap::with_key();
        let keys: Vec<ObjectKey> = (0..100).map(|i| arena.insert(i)).collect();
        // remove and reinsert so versions move past their first value
        for &key in &keys[..50] {
            arena.remove(key);
        }
        let reused: Vec<ObjectKey> = (0..50).map(|i| arena.insert(i)).collect();

        for key in keys.iter().chain(&reused) {
            let token = FilterToken::encode(*key);
            assert!(!token.is_empty());
            assert_eq!(token.decode(), Some(*key));
        }
    }

    #[test]
    fn test_raw_bits_spread_lowest_word_first() {
        let token = FilterToken::from_raw(0x0123_4567_89ab_cdef);
        assert_eq!(token.words(), [0x89ab_cdef, 0x0123_4567, 0, 0]);
        assert_eq!(token.to_raw(), 0x0123_4567_89ab_cdef);
    }

    #[test]
    fn test_extreme_raw_values_roundtrip() {
        for raw in [1, u64::from(u32::MAX), u64::from(u32::MAX) + 1, u64::MAX] {
            assert_eq!(FilterToken::from_raw(raw).to_raw(), raw);
        }
    }

    #[test]
    fn test_empty_token_decodes_to_nothing() {
        assert!(FilterToken::EMPTY.is_empty());
        assert_eq!(FilterToken::EMPTY.decode(), None);
        assert_eq!(FilterToken::encode(ObjectKey::null()), FilterToken::EMPTY);
    }

    #[test]
    fn test_default_response_flags() {
        let flags = PairFlags::DEFAULT_RESPONSE;
        assert!(flags.contains(PairFlags::CONTACT_DEFAULT | PairFlags::NOTIFY_TOUCH_FOUND));
        assert!(flags.contains(PairFlags::NOTIFY_CONTACT_POINTS | PairFlags::MODIFY_CONTACTS));
    }
}
