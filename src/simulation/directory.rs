//! In-memory registry of conversation partners.

use rand::seq::SliceRandom;
use rand::Rng;

use super::random::{generate_alias, generate_handles};

/// A conversation partner. Always holds at least one handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    alias: String,
    handles: Vec<String>,
    is_group: bool,
}

impl Recipient {
    pub fn new(alias: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            handles: vec![handle.into()],
            is_group: false,
        }
    }

    pub fn generate(rng: &mut impl Rng) -> Self {
        let alias = generate_alias(rng);
        let handles = generate_handles(rng, 1);
        Self {
            alias,
            handles,
            is_group: false,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn handles(&self) -> &[String] {
        &self.handles
    }

    /// The handle messages for this recipient are addressed to.
    pub fn primary_handle(&self) -> &str {
        &self.handles[0]
    }

    pub fn is_group(&self) -> bool {
        self.is_group
    }

    pub fn has_handle(&self, handle: &str) -> bool {
        self.handles.iter().any(|known| known == handle)
    }

    /// Record another handle for this recipient. Returns `false` if it was
    /// already known.
    pub fn add_handle(&mut self, handle: impl Into<String>) -> bool {
        let handle = handle.into();
        if self.has_handle(&handle) {
            return false;
        }
        self.handles.push(handle);
        true
    }
}

/// Recipients in insertion order. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct RecipientDirectory {
    recipients: Vec<Recipient>,
}

impl RecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory of `count` freshly generated recipients.
    pub fn generate(rng: &mut impl Rng, count: usize) -> Self {
        Self {
            recipients: generate_recipients(rng, count),
        }
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.recipients.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Recipient> {
        self.recipients.get(index)
    }

    pub fn find_by_handle(&self, handle: &str) -> Option<&Recipient> {
        self.recipients
            .iter()
            .find(|recipient| recipient.has_handle(handle))
    }

    /// Look up the recipient owning `handle`, creating one if none does.
    ///
    /// A created recipient gets a generated alias and exactly `[handle]` as
    /// its handles. The boolean is `true` when a recipient was created.
    pub fn resolve_or_create(&mut self, rng: &mut impl Rng, handle: &str) -> (&Recipient, bool) {
        if let Some(index) = self
            .recipients
            .iter()
            .position(|recipient| recipient.has_handle(handle))
        {
            return (&self.recipients[index], false);
        }
        let recipient = Recipient::new(generate_alias(rng), handle);
        self.recipients.push(recipient);
        let created = &self.recipients[self.recipients.len() - 1];
        (created, true)
    }

    pub fn pick_random(&self, rng: &mut impl Rng) -> Option<&Recipient> {
        self.recipients.choose(rng)
    }
}

pub fn generate_recipients(rng: &mut impl Rng, count: usize) -> Vec<Recipient> {
    (0..count).map(|_| Recipient::generate(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::random::is_generated_handle;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_generate_recipients() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let directory = RecipientDirectory::generate(&mut rng, 20);
        assert_eq!(directory.len(), 20);
        for recipient in directory.iter() {
            assert_eq!(recipient.handles().len(), 1);
            assert!(is_generated_handle(recipient.primary_handle()));
            assert!(!recipient.is_group());
            assert!(!recipient.alias().is_empty());
        }
    }

    #[test]
    fn test_find_by_handle() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let directory = RecipientDirectory::generate(&mut rng, 5);
        let target = directory.get(3).expect("fourth recipient").clone();
        assert_eq!(
            directory.find_by_handle(target.primary_handle()),
            Some(&target)
        );
        assert!(directory.find_by_handle("nobody@example.com").is_none());
    }

    #[test]
    fn test_resolve_or_create_unknown_handle() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut directory = RecipientDirectory::generate(&mut rng, 4);
        let (recipient, created) = directory.resolve_or_create(&mut rng, "+12345678");
        assert!(created);
        assert_eq!(recipient.handles(), &["+12345678".to_string()]);
        assert_eq!(directory.len(), 5);

        let (again, created) = directory.resolve_or_create(&mut rng, "+12345678");
        assert!(!created);
        assert_eq!(again.primary_handle(), "+12345678");
        assert_eq!(directory.len(), 5);
    }

    #[test]
    fn test_resolve_or_create_known_handle() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut directory = RecipientDirectory::generate(&mut rng, 3);
        let known = directory.get(1).expect("second recipient").clone();
        let (resolved, created) = directory.resolve_or_create(&mut rng, known.primary_handle());
        assert!(!created);
        assert_eq!(resolved, &known);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_add_handle_ignores_duplicates() {
        let mut recipient = Recipient::new("Ada", "+10000001");
        assert!(recipient.add_handle("10000001@icloud.com"));
        assert!(!recipient.add_handle("+10000001"));
        assert_eq!(recipient.handles().len(), 2);
        assert_eq!(recipient.primary_handle(), "+10000001");
    }

    #[test]
    fn test_pick_random_on_empty_directory() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(RecipientDirectory::new().pick_random(&mut rng).is_none());
    }
}
