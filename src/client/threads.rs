/**
 * Thread Aggregator
 *
 * Client-resident projection from raw messages to per-counterpart threads.
 * This is the component most exposed to concurrency hazards: it merges two
 * independently-timed input streams (the bulk history fetch and live relay
 * events) that race against each other.
 *
 * # Merge Discipline
 *
 * Both entry points go through the same dedup-insert path:
 *
 * - duplicates are discarded by message id (a relay echo of the caller's
 *   own send, or an event that arrives after a refetch already included
 *   the message)
 * - insertion keeps each thread ascending by timestamp, ties broken by id
 *   so the order is deterministic across interleavings
 *
 * Applying the same message twice, in any order, through either path,
 * yields the same thread as applying it once.
 */
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::shared::Message;

/// The derived, ordered view of all messages exchanged with one
/// counterpart. Never persisted; always a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    /// The other participant relative to the current user
    pub counterpart: Uuid,
    /// Ascending by timestamp; no two entries share an id
    pub messages: Vec<Message>,
    /// True iff some message here is inbound and unread
    pub unread: bool,
}

impl Thread {
    fn new(counterpart: Uuid) -> Self {
        Self {
            counterpart,
            messages: Vec::new(),
            unread: false,
        }
    }

    /// Whether a message with this id is already present
    pub fn contains(&self, id: Uuid) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    /// The most recent message, if any
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Insert preserving (timestamp, id) ascending order. Returns false
    /// and leaves the thread untouched when the id is already present.
    fn insert(&mut self, message: Message) -> bool {
        if self.contains(message.id) {
            return false;
        }

        let key = (message.timestamp, message.id);
        let pos = self
            .messages
            .partition_point(|m| (m.timestamp, m.id) <= key);
        self.messages.insert(pos, message);
        true
    }
}

/// Per-counterpart projection of the current user's message history,
/// continuously patched as live events arrive
pub struct ThreadAggregator {
    current_user: Uuid,
    threads: HashMap<Uuid, Thread>,
    unread_index: HashSet<Uuid>,
}

impl ThreadAggregator {
    pub fn new(current_user: Uuid) -> Self {
        Self {
            current_user,
            threads: HashMap::new(),
            unread_index: HashSet::new(),
        }
    }

    pub fn current_user(&self) -> Uuid {
        self.current_user
    }

    /// Merge a full history snapshot, then recompute every unread flag
    /// from message state.
    ///
    /// This merges rather than replaces: a live event that raced ahead of
    /// the snapshot (persisted after the server built it) survives the
    /// rebuild, and snapshot rows that were already applied live are
    /// dropped as duplicates.
    pub fn rebuild(&mut self, all_messages: Vec<Message>) {
        for message in all_messages {
            let counterpart = message.counterpart_of(self.current_user);
            self.threads
                .entry(counterpart)
                .or_insert_with(|| Thread::new(counterpart))
                .insert(message);
        }
        self.recompute_unread();
    }

    /// Merge a single live relay event into the projection.
    ///
    /// A duplicate id is a re-delivery and is discarded outright; in
    /// particular it does not re-flag the thread unread.
    pub fn apply_incoming(&mut self, message: Message) {
        let counterpart = message.counterpart_of(self.current_user);
        let inbound_unread = message.is_unread_for(self.current_user);

        let thread = self
            .threads
            .entry(counterpart)
            .or_insert_with(|| Thread::new(counterpart));

        if !thread.insert(message) {
            tracing::debug!("[Threads] duplicate event for thread {}, discarded", counterpart);
            return;
        }

        if inbound_unread {
            thread.unread = true;
            self.unread_index.insert(counterpart);
        }
    }

    /// Open a thread: clear its unread flag, drop it from the unread
    /// index, and optimistically mark the counterpart's inbound messages
    /// read locally.
    ///
    /// The server-side receipt is fired separately by the session layer;
    /// its failure does not roll this back.
    pub fn open_thread(&mut self, counterpart: Uuid) {
        self.unread_index.remove(&counterpart);

        if let Some(thread) = self.threads.get_mut(&counterpart) {
            thread.unread = false;
            for message in thread.messages.iter_mut() {
                // Same scoping as the server-side receipt: only inbound
                // messages flip.
                if message.sender.id == counterpart && message.receiver.id == self.current_user {
                    message.read = true;
                }
            }
        }
    }

    pub fn thread(&self, counterpart: Uuid) -> Option<&Thread> {
        self.threads.get(&counterpart)
    }

    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    /// Inbox ordering: threads by most recent activity, newest first
    pub fn inbox(&self) -> Vec<&Thread> {
        let mut threads: Vec<&Thread> = self.threads.values().collect();
        threads.sort_by(|a, b| {
            let a_key = a.latest().map(|m| m.timestamp);
            let b_key = b.latest().map(|m| m.timestamp);
            b_key.cmp(&a_key)
        });
        threads
    }

    /// Counterparts with at least one unread inbound message
    pub fn unread_counterparts(&self) -> &HashSet<Uuid> {
        &self.unread_index
    }

    /// The unread badge count
    pub fn unread_count(&self) -> usize {
        self.unread_index.len()
    }

    fn recompute_unread(&mut self) {
        self.unread_index.clear();
        for thread in self.threads.values_mut() {
            thread.unread = thread
                .messages
                .iter()
                .any(|m| m.is_unread_for(self.current_user));
            if thread.unread {
                self.unread_index.insert(thread.counterpart);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::UserRef;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn msg_at(sender: Uuid, receiver: Uuid, minutes: i64, read: bool) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender: UserRef::new(sender),
            receiver: UserRef::new(receiver),
            message: format!("m{}", minutes),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minutes),
            read,
        }
    }

    #[test]
    fn test_rebuild_groups_by_counterpart() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        agg.rebuild(vec![
            msg_at(me, b, 0, false),
            msg_at(b, me, 1, false),
            msg_at(c, me, 2, false),
        ]);

        assert_eq!(agg.thread(b).unwrap().messages.len(), 2);
        assert_eq!(agg.thread(c).unwrap().messages.len(), 1);
    }

    #[test]
    fn test_rebuild_sorts_by_timestamp() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        // Delivered out of chronological order.
        agg.rebuild(vec![
            msg_at(b, me, 5, false),
            msg_at(me, b, 1, false),
            msg_at(b, me, 3, false),
        ]);

        let thread = agg.thread(b).unwrap();
        let stamps: Vec<_> = thread.messages.iter().map(|m| m.timestamp).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }

    #[test]
    fn test_idempotent_merge_rebuild_then_event() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = msg_at(b, me, 0, false);

        let mut agg = ThreadAggregator::new(me);
        agg.rebuild(vec![m.clone()]);
        agg.apply_incoming(m.clone());

        let mut once = ThreadAggregator::new(me);
        once.rebuild(vec![m]);

        assert_eq!(agg.thread(b).unwrap(), once.thread(b).unwrap());
    }

    #[test]
    fn test_idempotent_merge_event_twice() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = msg_at(b, me, 0, false);

        let mut agg = ThreadAggregator::new(me);
        agg.apply_incoming(m.clone());
        agg.apply_incoming(m);

        assert_eq!(agg.thread(b).unwrap().messages.len(), 1);
    }

    #[test]
    fn test_live_event_survives_later_rebuild() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();

        // The event raced ahead of the snapshot: it is not in the backfill.
        let live = msg_at(b, me, 10, false);
        let snapshot = vec![msg_at(b, me, 0, true)];

        let mut agg = ThreadAggregator::new(me);
        agg.apply_incoming(live.clone());
        agg.rebuild(snapshot);

        let thread = agg.thread(b).unwrap();
        assert_eq!(thread.messages.len(), 2);
        assert!(thread.contains(live.id));
        assert!(thread.unread);
    }

    #[test]
    fn test_own_echo_does_not_flag_unread() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        agg.apply_incoming(msg_at(me, b, 0, false));

        let thread = agg.thread(b).unwrap();
        assert!(!thread.unread);
        assert_eq!(agg.unread_count(), 0);
    }

    #[test]
    fn test_inbound_event_flags_unread() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        agg.apply_incoming(msg_at(b, me, 0, false));

        assert!(agg.thread(b).unwrap().unread);
        assert!(agg.unread_counterparts().contains(&b));
        assert_eq!(agg.unread_count(), 1);
    }

    #[test]
    fn test_duplicate_event_does_not_reflag_unread() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = msg_at(b, me, 0, false);

        let mut agg = ThreadAggregator::new(me);
        agg.apply_incoming(m.clone());
        agg.open_thread(b);

        // A re-delivery of the already-known message must not reopen the
        // unread state.
        agg.apply_incoming(m);
        assert!(!agg.thread(b).unwrap().unread);
        assert_eq!(agg.unread_count(), 0);
    }

    #[test]
    fn test_open_thread_clears_unread_and_marks_read() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        agg.rebuild(vec![msg_at(b, me, 0, false), msg_at(me, b, 1, false)]);
        assert_eq!(agg.unread_count(), 1);

        agg.open_thread(b);

        let thread = agg.thread(b).unwrap();
        assert!(!thread.unread);
        assert_eq!(agg.unread_count(), 0);
        // Inbound message flipped, own message untouched.
        for m in &thread.messages {
            if m.sender.id == b {
                assert!(m.read);
            } else {
                assert!(!m.read);
            }
        }
    }

    #[test]
    fn test_optimistic_read_survives_stale_rebuild() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let m = msg_at(b, me, 0, false);

        let mut agg = ThreadAggregator::new(me);
        agg.rebuild(vec![m.clone()]);
        agg.open_thread(b);

        // A refetch whose snapshot predates the server-side receipt still
        // carries read=false; dedup keeps the locally-read copy.
        agg.rebuild(vec![m]);
        assert!(!agg.thread(b).unwrap().unread);
        assert_eq!(agg.unread_count(), 0);
    }

    #[test]
    fn test_unread_correctness_invariant() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        agg.rebuild(vec![
            msg_at(b, me, 0, true),  // inbound, already read
            msg_at(me, b, 1, false), // own message, read flag irrelevant
            msg_at(c, me, 2, false), // inbound, unread
        ]);

        for thread in agg.threads() {
            let expected = thread.messages.iter().any(|m| m.is_unread_for(me));
            assert_eq!(thread.unread, expected);
            assert_eq!(agg.unread_counterparts().contains(&thread.counterpart), expected);
        }
        assert_eq!(agg.unread_count(), 1);
    }

    #[test]
    fn test_inbox_orders_by_latest_activity() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let mut agg = ThreadAggregator::new(me);
        agg.rebuild(vec![msg_at(b, me, 0, false), msg_at(c, me, 5, false)]);

        let inbox = agg.inbox();
        assert_eq!(inbox[0].counterpart, c);
        assert_eq!(inbox[1].counterpart, b);
    }

    #[test]
    fn test_confluence_across_interleavings() {
        let me = Uuid::new_v4();
        let b = Uuid::new_v4();

        let all: Vec<Message> = (0..6).map(|i| msg_at(b, me, i, false)).collect();

        // Interleaving 1: everything via rebuild.
        let mut agg1 = ThreadAggregator::new(me);
        agg1.rebuild(all.clone());

        // Interleaving 2: some live first, then rebuild, then re-delivery.
        let mut agg2 = ThreadAggregator::new(me);
        agg2.apply_incoming(all[4].clone());
        agg2.apply_incoming(all[1].clone());
        agg2.rebuild(all.clone());
        agg2.apply_incoming(all[4].clone());

        // Interleaving 3: rebuild first, then all events again.
        let mut agg3 = ThreadAggregator::new(me);
        agg3.rebuild(all.clone());
        for m in &all {
            agg3.apply_incoming(m.clone());
        }

        assert_eq!(agg1.thread(b).unwrap(), agg2.thread(b).unwrap());
        assert_eq!(agg1.thread(b).unwrap(), agg3.thread(b).unwrap());
    }
}
