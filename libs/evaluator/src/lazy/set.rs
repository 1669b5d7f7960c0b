//! Set populated on first use.

use crate::error::Result;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Source<T> = Box<dyn Iterator<Item = Result<T>> + Send>;

struct State<T> {
    cache: Vec<T>,
    seen: HashSet<T>,
    source: Option<Source<T>>,
    fetched: bool,
}

impl<T: Clone + Eq + Hash> State<T> {
    /// Pull source elements until one not already cached arrives. Returns its index, or
    /// `None` once the source is drained.
    fn fetch_next(&mut self) -> Result<Option<usize>> {
        loop {
            let Some(source) = self.source.as_mut() else {
                self.fetched = true;
                return Ok(None);
            };
            match source.next() {
                None => {
                    self.source = None;
                    self.fetched = true;
                    tracing::trace!(elements = self.cache.len(), "Lazy set fully fetched");
                    return Ok(None);
                }
                Some(Err(e)) => return Err(e),
                Some(Ok(item)) => {
                    if self.seen.insert(item.clone()) {
                        self.cache.push(item);
                        return Ok(Some(self.cache.len() - 1));
                    }
                }
            }
        }
    }

    fn drain(&mut self) -> Result<()> {
        while !self.fetched {
            self.fetch_next()?;
        }
        Ok(())
    }
}

/// Set whose elements are fetched from a source only as far as each question needs.
///
/// `is_empty` and `contains` fetch minimally; `len`, `to_vec` and a complete iteration
/// drain the source. The fetch-and-advance step is serialized by one lock, so a single
/// iteration may interleave cached and newly fetched elements without duplicates.
pub struct LazyFetchingSet<T> {
    state: Mutex<State<T>>,
}

impl<T: Clone + Eq + Hash> LazyFetchingSet<T> {
    pub fn new<I>(source: I) -> Self
    where
        I: Iterator<Item = Result<T>> + Send + 'static,
    {
        Self {
            state: Mutex::new(State {
                cache: Vec::new(),
                seen: HashSet::new(),
                source: Some(Box::new(source)),
                fetched: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> Result<bool> {
        let mut state = self.lock();
        if !state.cache.is_empty() {
            return Ok(false);
        }
        Ok(state.fetch_next()?.is_none())
    }

    pub fn contains(&self, item: &T) -> Result<bool> {
        let mut state = self.lock();
        if state.seen.contains(item) {
            return Ok(true);
        }
        while let Some(index) = state.fetch_next()? {
            if &state.cache[index] == item {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn len(&self) -> Result<usize> {
        let mut state = self.lock();
        state.drain()?;
        Ok(state.cache.len())
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        let mut state = self.lock();
        state.drain()?;
        Ok(state.cache.clone())
    }

    /// Add an element directly; returns `false` if it was already present.
    pub fn insert(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.seen.insert(item.clone()) {
            state.cache.push(item);
            true
        } else {
            false
        }
    }

    /// Whether the source has been drained.
    pub fn is_fetched(&self) -> bool {
        self.lock().fetched
    }

    /// Elements fetched so far.
    pub fn cached_len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            set: self,
            index: 0,
        }
    }
}

impl<T> fmt::Debug for LazyFetchingSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("LazyFetchingSet")
            .field("cached", &state.cache.len())
            .field("fetched", &state.fetched)
            .finish()
    }
}

/// Iterator reading cached elements first and fetching the rest on demand.
pub struct Iter<'a, T> {
    set: &'a LazyFetchingSet<T>,
    index: usize,
}

impl<T: Clone + Eq + Hash> Iterator for Iter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut state = self.set.lock();
        if self.index < state.cache.len() {
            self.index += 1;
            return Some(Ok(state.cache[self.index - 1].clone()));
        }
        if state.fetched {
            return None;
        }
        match state.fetch_next() {
            Ok(Some(index)) => {
                self.index = index + 1;
                Some(Ok(state.cache[index].clone()))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
