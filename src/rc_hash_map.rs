//! A hash map whose entries carry a reference count and are only purged in bulk once that count reaches zero.
//!
//! Entries whose count dropped to zero ("weak" entries) stay in place until [`RcHashMap::drain_weak`] is called,
//! so a decrement immediately followed by an increment keeps the original value.

use core::{
	borrow::Borrow,
	hash::{BuildHasher, Hash},
};
use hashbrown::{
	hash_map::{DefaultHashBuilder, Entry, ExtractIf},
	HashMap,
};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};
use thiserror::Error;

#[derive(Debug)]
pub struct RcHashMap<K, C, V, S = DefaultHashBuilder>(HashMap<K, (C, V), S>)
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero,
	S: BuildHasher;
impl<K, C, V, S> Default for RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
	S: Default + BuildHasher,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<K, C, V, S> RcHashMap<K, C, V, S>
where
	K: Hash + Eq,
	C: CheckedAdd + CheckedSub + One + Zero + Copy,
	S: BuildHasher,
{
	#[must_use]
	pub fn new() -> Self
	where
		S: Default,
	{
		Self(HashMap::with_hasher(S::default()))
	}

	/// Increments the count of `k`, inserting `v()` with a count of one if absent.
	///
	/// The returned flag is `true` if the entry was absent or weak before, i.e. it just became live.
	///
	/// # Errors
	///
	/// Iff the count would overflow `C`.
	pub fn increment_or_insert_with<F: FnOnce() -> V>(&mut self, k: K, v: F) -> Result<(&mut V, bool), CountSaturatedError> {
		match self.0.entry(k) {
			Entry::Occupied(occupied) => {
				let (c, v) = occupied.into_mut();
				let revived = c.is_zero();
				*c = c.checked_add(&C::one()).ok_or(CountSaturatedError)?;
				Ok((v, revived))
			}
			Entry::Vacant(vacant) => {
				let (_, v) = vacant.insert((C::one(), v()));
				Ok((v, true))
			}
		}
	}

	/// Decrements the count of `k` without removing the entry.
	///
	/// # Errors
	///
	/// Iff the count is already zero.
	pub fn weak_decrement<Q: ?Sized>(&mut self, k: &Q) -> Result<Option<&mut V>, CountSaturatedError>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		match self.0.get_mut(k) {
			Some((c, v)) => {
				*c = c.checked_sub(&C::one()).ok_or(CountSaturatedError)?;
				Ok(Some(v))
			}
			None => Ok(None),
		}
	}

	/// Current count of `k`, zero if absent.
	pub fn count<Q: ?Sized>(&self, k: &Q) -> C
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.get(k).map_or_else(C::zero, |&(c, _)| c)
	}

	pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Eq + Hash,
	{
		self.0.get(k).map(|(_, v)| v)
	}

	/// Number of entries, including weak ones.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn capacity(&self) -> usize {
		self.0.capacity()
	}

	/// Removes and yields all entries with a count of zero.
	pub fn drain_weak(&mut self) -> DrainWeak<'_, K, C, V> {
		let filter: fn(&K, &mut (C, V)) -> bool = is_weak;
		DrainWeak(self.0.extract_if(filter))
	}
}

fn is_weak<K, C: Zero, V>(_: &K, (c, _): &mut (C, V)) -> bool {
	c.is_zero()
}

pub struct DrainWeak<'a, K, C, V>(ExtractIf<'a, K, (C, V), fn(&K, &mut (C, V)) -> bool>);
impl<'a, K, C, V> Iterator for DrainWeak<'a, K, C, V> {
	type Item = (K, V);

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next().map(|(k, (_, v))| (k, v))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.0.size_hint()
	}
}

#[derive(Debug, Error)]
#[error("reference count saturated")]
pub struct CountSaturatedError;
