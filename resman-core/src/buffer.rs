use crate::{Address, Message, MessageId, Transport, TransportError};
use log::{debug, warn};
use std::{cmp::Reverse, collections::BTreeMap, fmt};

/// # Partitioned message buffer
///
/// Every node has one. Messages are stored in partitions keyed by the
/// address of a counterpart node (usually the message's source) so that
/// one chatty counterpart can't starve the others: when the buffer goes
/// over its capacity, the *largest* partition pays first.
///
/// ## Eviction
///
/// After every [`admit`] and while the total usage exceeds the
/// capacity:
///
/// 1. pick the partition with the highest usage (lowest address on ties);
/// 2. drop its oldest message by receive time, never the message that
///    was just admitted;
/// 3. if that partition only holds the just admitted message, drop the
///    oldest message of the second largest partition instead.
///
/// Every dropped message is also deleted from the node's [`Transport`]
/// store.
///
/// If no victim can be found (a single message larger than the whole
/// buffer) the pass is aborted and the buffer stays over capacity.
///
/// [`admit`]: PartitionedBuffer::admit
#[derive(Debug, Clone)]
pub struct PartitionedBuffer {
    /// the node this buffer belongs to
    owner: Address,

    /// maximum number of bytes
    capacity: u64,

    /// bytes currently used across all partitions
    used: u64,

    partitions: BTreeMap<Address, Partition>,

    /// admission counter, tells identical messages (and identical
    /// receive times) apart
    next_seq: u64,
}

#[derive(Debug, Clone, Default)]
struct Partition {
    entries: Vec<Entry>,
    usage: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    message: Message,
}

impl Partition {
    fn push(&mut self, entry: Entry) {
        self.usage += entry.message.size();
        self.entries.push(entry);
    }

    fn remove(&mut self, index: usize) -> Entry {
        let entry = self.entries.remove(index);
        self.usage -= entry.message.size();
        entry
    }

    /// index of the oldest message, skipping the admission `exclude`
    fn oldest(&self, exclude: Option<u64>) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| Some(entry.seq) != exclude)
            .min_by_key(|(_, entry)| (entry.message.received(), entry.seq))
            .map(|(index, _)| index)
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.message.id() == id)
    }
}

impl PartitionedBuffer {
    /// create an empty buffer for the node `owner`
    pub fn new(owner: Address, capacity: u64) -> Self {
        Self {
            owner,
            capacity,
            used: 0,
            partitions: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// maximum number of bytes the buffer should hold
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// bytes used by the messages of `partition`, `0` if there is no
    /// such partition
    pub fn usage(&self, partition: Address) -> u64 {
        self.partitions
            .get(&partition)
            .map(|partition| partition.usage)
            .unwrap_or_default()
    }

    /// bytes used by all the messages in the buffer
    #[inline]
    pub fn total_usage(&self) -> u64 {
        self.used
    }

    /// number of messages in the buffer
    pub fn len(&self) -> usize {
        self.partitions.values().map(|p| p.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.partitions
            .values()
            .any(|partition| partition.position(id).is_some())
    }

    /// the non empty partitions and their usage, by ascending address
    pub fn partitions(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.partitions
            .iter()
            .map(|(key, partition)| (*key, partition.usage))
    }

    /// the messages of `partition`, in admission order
    pub fn messages(&self, partition: Address) -> impl Iterator<Item = &Message> + '_ {
        self.partitions
            .get(&partition)
            .into_iter()
            .flat_map(|partition| partition.entries.iter().map(|entry| &entry.message))
    }

    /// Store `message` in `partition` then evict until the buffer is
    /// back under its capacity.
    ///
    /// The message itself is never the victim of its own admission
    /// unless there is nothing else to evict, in which case the buffer
    /// is left over capacity.
    pub fn admit<T>(&mut self, partition: Address, message: Message, transport: &mut T)
    where
        T: Transport + ?Sized,
    {
        let seq = self.next_seq;
        self.next_seq += 1;

        debug!(
            "node {}: buffering {message} into partition {partition}",
            self.owner
        );

        self.used += message.size();
        self.partitions
            .entry(partition)
            .or_default()
            .push(Entry { seq, message });

        self.evict(seq, transport);
    }

    /// Remove the message `id` from whichever partition holds it.
    ///
    /// Unknown identifiers are ignored, so calling this twice is the
    /// same as calling it once.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let (key, index) = self
            .partitions
            .iter()
            .find_map(|(key, partition)| partition.position(id).map(|index| (*key, index)))?;

        let entry = self.take(key, index)?;
        debug!(
            "node {}: removed {} from partition {key}",
            self.owner, entry.message
        );
        Some(entry.message)
    }

    fn evict<T>(&mut self, fresh: u64, transport: &mut T)
    where
        T: Transport + ?Sized,
    {
        while self.used > self.capacity {
            let Some((key, index)) = self.select_victim(fresh) else {
                warn!(
                    "node {}: buffer over capacity ({}/{} bytes) with nothing left to evict",
                    self.owner, self.used, self.capacity
                );
                break;
            };

            let Some(Entry { message, .. }) = self.take(key, index) else {
                break;
            };
            debug!(
                "node {}: dropping {message} from partition {key} ({}/{} bytes)",
                self.owner, self.used, self.capacity
            );

            match transport.delete(self.owner, message.id()) {
                Ok(()) => (),
                Err(TransportError::NotFound { .. }) => {
                    debug!("node {}: {} was already gone", self.owner, message.id())
                }
                Err(error) => warn!("node {}: failed to delete {message}: {error}", self.owner),
            }
        }
    }

    fn select_victim(&self, fresh: u64) -> Option<(Address, usize)> {
        let highest = self.largest_partition(None)?;
        if let Some(index) = self.partitions[&highest].oldest(Some(fresh)) {
            return Some((highest, index));
        }

        debug!(
            "node {}: partition {highest} only holds the message being admitted",
            self.owner
        );

        let second = self.largest_partition(Some(highest))?;
        let index = self.partitions[&second].oldest(None)?;
        Some((second, index))
    }

    fn largest_partition(&self, except: Option<Address>) -> Option<Address> {
        self.partitions
            .iter()
            .filter(|(key, _)| Some(**key) != except)
            .min_by_key(|(key, partition)| (Reverse(partition.usage), **key))
            .map(|(key, _)| *key)
    }

    fn take(&mut self, key: Address, index: usize) -> Option<Entry> {
        let partition = self.partitions.get_mut(&key)?;
        if index >= partition.entries.len() {
            return None;
        }

        let entry = partition.remove(index);
        if partition.entries.is_empty() {
            self.partitions.remove(&key);
        }
        self.used -= entry.message.size();
        Some(entry)
    }
}

impl fmt::Display for PartitionedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (key, partition) in &self.partitions {
            write!(f, " {key}: [")?;
            for (i, entry) in partition.entries.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", entry.message.id())?;
            }
            write!(f, "]")?;
        }
        write!(f, " ] {}/{} bytes", self.used, self.capacity)
    }
}
