use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;

/// Default number of buckets used for relevance accumulation.
pub const DEFAULT_BUCKET_COUNT: usize = 100;

/// Integer keys that can be routed to a bucket.
pub trait BucketKey: Copy + Ord + Send {
    /// Bucket index in `0..bucket_count`. Keys are expected to be non-negative.
    fn bucket(self, bucket_count: usize) -> usize;
}

macro_rules! impl_bucket_key {
    ($($t:ty),*) => {
        $(
            impl BucketKey for $t {
                #[inline]
                fn bucket(self, bucket_count: usize) -> usize {
                    (self as u64 % bucket_count as u64) as usize
                }
            }
        )*
    };
}

impl_bucket_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// A map split into independently locked buckets.
///
/// A key lives in bucket `key % bucket_count`; every operation locks only that
/// bucket, so writers touching different buckets proceed in parallel. No call
/// ever holds more than one bucket lock.
pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: BucketKey, V: Default> ConcurrentMap<K, V> {
    pub fn new(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self { buckets: (0..bucket_count).map(|_| Mutex::new(BTreeMap::new())).collect() }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Locked access to the value for `key`, inserting `V::default()` when absent.
    /// The bucket stays locked until the returned guard is dropped.
    pub fn access(&self, key: K) -> MappedMutexGuard<'_, V> {
        let guard = self.lock_bucket(key);
        MutexGuard::map(guard, |bucket| bucket.entry(key).or_default())
    }

    pub fn erase(&self, key: K) -> Option<V> {
        self.lock_bucket(key).remove(&key)
    }

    /// Drain every bucket, one lock at a time, into a single ordered map.
    pub fn build_ordinary_map(&self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for bucket in &self.buckets {
            let mut contents = std::mem::take(&mut *bucket.lock());
            result.append(&mut contents);
        }
        result
    }

    fn lock_bucket(&self, key: K) -> MutexGuard<'_, BTreeMap<K, V>> {
        self.buckets[key.bucket(self.buckets.len())].lock()
    }
}

impl<K: BucketKey, V: Default> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT)
    }
}
