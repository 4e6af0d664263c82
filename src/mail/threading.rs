use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::types::{EmailHeaders, Month, ThreadKey};

/// Message-ID -> sender map, filled in as records are processed.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    senders: HashMap<String, String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the sender of `message_id`.
    pub fn register(&mut self, message_id: &str, sender: &str) {
        self.senders
            .insert(message_id.to_string(), sender.to_string());
    }

    pub fn lookup(&self, message_id: &str) -> Option<&str> {
        self.senders.get(message_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Senders of one thread: the originating author once known, then repliers
/// in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadEntry {
    root: Option<String>,
    replies: Vec<String>,
}

impl ThreadEntry {
    pub fn is_empty(&self) -> bool {
        self.root.is_none() && self.replies.is_empty()
    }

    /// First sender in output order
    pub fn first(&self) -> Option<&str> {
        self.root.as_deref().or(self.replies.first().map(String::as_str))
    }

    /// A message that starts the thread. Takes the root slot when it is free,
    /// even if replies were seen first.
    fn seed(&mut self, sender: &str) {
        if self.root.is_none() {
            self.root = Some(sender.to_string());
        } else {
            self.replies.push(sender.to_string());
        }
    }

    /// Put `origin` in front of the current first sender.
    fn promote(&mut self, origin: &str) {
        if let Some(previous) = self.root.replace(origin.to_string()) {
            self.replies.insert(0, previous);
        }
    }

    fn push_reply(&mut self, sender: &str) {
        self.replies.push(sender.to_string());
    }

    /// Flatten to output order: root first, then replies.
    pub fn senders(&self) -> Vec<String> {
        self.root
            .iter()
            .chain(self.replies.iter())
            .cloned()
            .collect()
    }
}

/// Thread graph and reply counts for a single year.
///
/// Owns the year's identity resolver, so nothing resolves across years.
#[derive(Debug)]
pub struct YearThreads {
    year: u16,
    resolver: IdentityResolver,
    graph: HashMap<ThreadKey, ThreadEntry>,
    stats: HashMap<ThreadKey, u64>,
}

impl YearThreads {
    pub fn new(year: u16) -> Self {
        Self {
            year,
            resolver: IdentityResolver::new(),
            graph: HashMap::new(),
            stats: HashMap::new(),
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn entry(&self, key: &ThreadKey) -> Option<&ThreadEntry> {
        self.graph.get(key)
    }

    pub fn reply_count(&self, key: &ThreadKey) -> u64 {
        self.stats.get(key).copied().unwrap_or(0)
    }

    /// Feed one record, in arrival order.
    ///
    /// Returns `false` when the record could not be placed in the graph
    /// (no sender, or neither a Message-ID nor a References header).
    pub fn observe(&mut self, month: Month, headers: &EmailHeaders) -> bool {
        let Some(sender) = headers.sender.as_deref() else {
            return false;
        };

        if let Some(id) = headers.message_id.as_deref() {
            self.resolver.register(id, sender);
        }

        match (headers.reference.as_deref(), headers.message_id.as_deref()) {
            (Some(reference), _) => {
                self.observe_reply(month, sender, reference);
                true
            }
            (None, Some(id)) => {
                let key = ThreadKey::new(self.year, month, id);
                self.graph.entry(key).or_default().seed(sender);
                true
            }
            (None, None) => false,
        }
    }

    fn observe_reply(&mut self, month: Month, sender: &str, reference: &str) {
        let key = ThreadKey::new(self.year, month, reference);
        *self.stats.entry(key.clone()).or_insert(0) += 1;

        let origin = self.resolver.lookup(reference).map(str::to_string);
        let entry = self.graph.entry(key).or_default();

        if let Some(origin) = origin.as_deref() {
            if !entry.is_empty() && entry.first() != Some(origin) {
                log::debug!("promoting {origin} to root of thread {reference}");
                entry.promote(origin);
            }
        }

        // Only compared against the origin, not the whole thread
        if origin.as_deref() != Some(sender) {
            entry.push_reply(sender);
        }
    }

    /// Hand off the year's aggregates, keyed by `year/Month/id`.
    pub fn finish(self) -> YearSummary {
        let stats = self
            .stats
            .into_iter()
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        let graph = self
            .graph
            .into_iter()
            .map(|(key, entry)| (key.to_string(), entry.senders()))
            .collect();

        YearSummary {
            year: self.year,
            stats,
            graph,
        }
    }
}

/// Per-year output: reply counts and sender lists by thread key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u16,
    pub stats: BTreeMap<String, u64>,
    pub graph: BTreeMap<String, Vec<String>>,
}

impl YearSummary {
    pub fn thread_count(&self) -> usize {
        self.graph.len()
    }

    pub fn reply_count(&self) -> u64 {
        self.stats.values().sum()
    }
}

/// Union of several years' aggregates. Keys embed the year, so years never
/// overwrite each other.
pub fn merge_summaries<'a>(
    summaries: impl IntoIterator<Item = &'a YearSummary>,
) -> (BTreeMap<String, u64>, BTreeMap<String, Vec<String>>) {
    let mut stats = BTreeMap::new();
    let mut graph = BTreeMap::new();

    for summary in summaries {
        stats.extend(summary.stats.iter().map(|(k, v)| (k.clone(), *v)));
        graph.extend(summary.graph.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    (stats, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::headers::extract_headers;
    use crate::mail::segment::segment;

    fn headers(sender: &str, id: Option<&str>, reference: Option<&str>) -> EmailHeaders {
        EmailHeaders {
            sender: Some(sender.to_string()),
            message_id: id.map(str::to_string),
            reference: reference.map(str::to_string),
        }
    }

    fn jan() -> Month {
        Month::new(1).unwrap()
    }

    #[test]
    fn test_resolver() {
        let mut resolver = IdentityResolver::new();
        assert!(resolver.is_empty());
        resolver.register("m1", "a@x.com");
        assert_eq!(resolver.lookup("m1"), Some("a@x.com"));
        resolver.register("m1", "b@y.com");
        assert_eq!(resolver.lookup("m1"), Some("b@y.com"));
        assert_eq!(resolver.lookup("m2"), None);
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_two_record_archive() {
        let text = "From a at x.com Mon Jan 1\nFrom: a at x.com\nMessage-ID: <m1>\nhello\nFrom b at y.com Tue Jan 2\nFrom: b at y.com\nMessage-ID: <m2>\nReferences: <m1>\nhi";
        let mut threads = YearThreads::new(2007);
        for record in segment(text) {
            assert!(threads.observe(jan(), &extract_headers(record.text)));
        }

        let summary = threads.finish();
        assert_eq!(
            summary.graph["2007/January/m1"],
            vec!["a@x.com".to_string(), "b@y.com".to_string()]
        );
        assert_eq!(summary.stats["2007/January/m1"], 1);
        assert_eq!(summary.stats.len(), 1);
    }

    #[test]
    fn test_root_seen_after_reply() {
        let mut threads = YearThreads::new(2010);
        threads.observe(jan(), &headers("B", Some("2"), Some("1")));
        threads.observe(jan(), &headers("A", Some("1"), None));
        threads.observe(jan(), &headers("A", Some("3"), Some("1")));

        let key = ThreadKey::new(2010, jan(), "1");
        assert_eq!(threads.entry(&key).unwrap().senders(), vec!["A", "B"]);
        assert_eq!(threads.reply_count(&key), 2);
    }

    #[test]
    fn test_unresolved_reference_still_creates_thread() {
        let mut threads = YearThreads::new(2010);
        threads.observe(jan(), &headers("B", Some("2"), Some("missing")));

        let key = ThreadKey::new(2010, jan(), "missing");
        assert_eq!(threads.entry(&key).unwrap().senders(), vec!["B"]);
        assert_eq!(threads.reply_count(&key), 1);
    }

    #[test]
    fn test_non_consecutive_repeat_is_kept() {
        let mut threads = YearThreads::new(2010);
        threads.observe(jan(), &headers("A", Some("1"), None));
        threads.observe(jan(), &headers("B", Some("2"), Some("1")));
        threads.observe(jan(), &headers("C", Some("3"), Some("1")));
        threads.observe(jan(), &headers("B", Some("4"), Some("1")));
        threads.observe(jan(), &headers("A", Some("5"), Some("1")));

        let key = ThreadKey::new(2010, jan(), "1");
        assert_eq!(threads.entry(&key).unwrap().senders(), vec!["A", "B", "C", "B"]);
        assert_eq!(threads.reply_count(&key), 4);
    }

    #[test]
    fn test_promotion_ahead_of_different_root() {
        let mut threads = YearThreads::new(2010);
        // Two messages share an identifier; the later one wins the resolver
        threads.observe(jan(), &headers("A", Some("1"), None));
        threads.observe(jan(), &headers("Z", Some("1"), Some("0")));
        threads.observe(jan(), &headers("B", Some("2"), Some("1")));

        let key = ThreadKey::new(2010, jan(), "1");
        assert_eq!(threads.entry(&key).unwrap().senders(), vec!["Z", "A", "B"]);
    }

    #[test]
    fn test_reply_in_later_month_is_keyed_by_its_own_month() {
        let feb = Month::new(2).unwrap();
        let mut threads = YearThreads::new(2010);
        threads.observe(jan(), &headers("A", Some("1"), None));
        threads.observe(feb, &headers("B", Some("2"), Some("1")));

        let summary = threads.finish();
        assert_eq!(summary.graph["2010/January/1"], vec!["A"]);
        assert_eq!(summary.graph["2010/February/1"], vec!["B"]);
        assert_eq!(summary.stats["2010/February/1"], 1);
    }

    #[test]
    fn test_later_month_self_reply_leaves_empty_entry() {
        let feb = Month::new(2).unwrap();
        let mut threads = YearThreads::new(2010);
        threads.observe(jan(), &headers("A", Some("1"), None));
        threads.observe(feb, &headers("A", Some("2"), Some("1")));

        let summary = threads.finish();
        assert_eq!(summary.graph["2010/January/1"], vec!["A"]);
        // Counted, but the root lives under January so nothing is listed
        assert_eq!(summary.graph["2010/February/1"], Vec::<String>::new());
        assert_eq!(summary.stats["2010/February/1"], 1);
    }

    #[test]
    fn test_missing_message_id_does_not_reuse_previous() {
        let mut threads = YearThreads::new(2010);
        threads.observe(jan(), &headers("A", Some("1"), None));
        assert!(!threads.observe(jan(), &headers("B", None, None)));
        assert!(threads.observe(jan(), &headers("C", None, Some("1"))));

        assert_eq!(threads.resolver().len(), 1);
        assert_eq!(threads.resolver().lookup("1"), Some("A"));
        let key = ThreadKey::new(2010, jan(), "1");
        assert_eq!(threads.entry(&key).unwrap().senders(), vec!["A", "C"]);
    }

    #[test]
    fn test_record_without_sender_is_ignored() {
        let mut threads = YearThreads::new(2010);
        let no_sender = EmailHeaders {
            sender: None,
            message_id: Some("1".to_string()),
            reference: None,
        };
        assert!(!threads.observe(jan(), &no_sender));
        assert!(threads.resolver().is_empty());
        assert_eq!(threads.finish().thread_count(), 0);
    }

    #[test]
    fn test_merge_summaries() {
        let mut first = YearThreads::new(2008);
        first.observe(jan(), &headers("A", Some("1"), None));
        first.observe(jan(), &headers("B", Some("2"), Some("1")));
        let mut second = YearThreads::new(2009);
        second.observe(jan(), &headers("C", Some("1"), None));

        let summaries = [first.finish(), second.finish()];
        let (stats, graph) = merge_summaries(&summaries);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph["2008/January/1"], vec!["A", "B"]);
        assert_eq!(graph["2009/January/1"], vec!["C"]);
        assert_eq!(stats.len(), 1);
        assert_eq!(summaries[0].reply_count(), 1);
    }
}
