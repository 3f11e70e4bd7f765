// File: src/pool/mod.rs

use std::collections::VecDeque;
use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;

use codedrop_common::error::Error;

/// Finite ordered collection of single-use reward codes.
///
/// `dispense` runs under a single mutex so that no code is ever handed to two
/// callers, even when claim attempts execute in parallel. Pool size only
/// decreases; a dispensed code never comes back.
pub struct CodePool {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for CodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CodePool")
            .field("remaining", &inner.codes.len())
            .field("dispensed", &inner.dispensed)
            .finish()
    }
}

struct Inner {
    codes: VecDeque<String>,
    dispensed: usize,
}

impl CodePool {
    /// Build a pool from codes already in hand. Blank lines are dropped;
    /// an empty set fails with [`Error::CodeLoad`].
    pub fn from_codes<I>(codes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = String>,
    {
        let codes: VecDeque<String> = codes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if codes.is_empty() {
            return Err(Error::CodeLoad("code source contained no codes".into()));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                codes,
                dispensed: 0,
            }),
        })
    }

    /// Read a newline-separated code file, once, at publish time.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::CodeLoad(format!(
                "could not read code source '{}': {e}",
                path.display()
            ))
        })?;

        let pool = Self::from_codes(raw.lines().map(str::to_string))?;
        debug!("loaded {} codes from '{}'", pool.remaining(), path.display());
        Ok(pool)
    }

    /// Atomically remove and return one code. Exactly one caller receives any
    /// given code; an empty pool fails with [`Error::PoolExhausted`].
    pub fn dispense(&self) -> Result<String, Error> {
        let mut inner = self.inner.lock();
        match inner.codes.pop_front() {
            Some(code) => {
                inner.dispensed += 1;
                Ok(code)
            }
            None => Err(Error::PoolExhausted),
        }
    }

    /// Current count, for display purposes only.
    pub fn remaining(&self) -> usize {
        self.inner.lock().codes.len()
    }

    pub fn dispensed(&self) -> usize {
        self.inner.lock().dispensed
    }

    /// Drop up to `n` codes from the front without handing them to anyone.
    /// Used on resume to skip codes that left the pool before a restart.
    pub fn fast_forward(&self, n: usize) {
        let mut inner = self.inner.lock();
        for _ in 0..n {
            if inner.codes.pop_front().is_none() {
                break;
            }
            inner.dispensed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn empty_source_is_a_load_error() {
        let err = CodePool::from_codes(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::CodeLoad(_)));

        // whitespace-only lines count as empty
        let err = CodePool::from_codes(vec!["  ".to_string(), "".to_string()]).unwrap_err();
        assert!(matches!(err, Error::CodeLoad(_)));
    }

    #[test]
    fn dispenses_in_order_until_exhausted() {
        let pool =
            CodePool::from_codes(["A", "B"].iter().map(|s| s.to_string())).unwrap();
        assert_eq!(pool.remaining(), 2);

        assert_eq!(pool.dispense().unwrap(), "A");
        assert_eq!(pool.dispense().unwrap(), "B");
        assert_eq!(pool.remaining(), 0);
        assert_eq!(pool.dispensed(), 2);

        assert!(matches!(pool.dispense(), Err(Error::PoolExhausted)));
        // failed dispense changes nothing
        assert_eq!(pool.dispensed(), 2);
    }

    #[test]
    fn concurrent_dispense_hands_each_code_to_one_caller() {
        let pool = Arc::new(
            CodePool::from_codes((0..50).map(|i| format!("code-{i}"))).unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(std::thread::spawn(move || {
                let mut got = Vec::new();
                while let Ok(code) = pool.dispense() {
                    got.push(code);
                }
                got
            }));
        }

        let mut all: Vec<String> = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }

        assert_eq!(all.len(), 50);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 50, "a code was dispensed twice");
        assert_eq!(pool.remaining(), 0);
    }

    #[test]
    fn fast_forward_skips_from_the_front() {
        let pool =
            CodePool::from_codes(["A", "B", "C"].iter().map(|s| s.to_string())).unwrap();
        pool.fast_forward(2);
        assert_eq!(pool.remaining(), 1);
        assert_eq!(pool.dispense().unwrap(), "C");

        // over-running the pool is harmless
        pool.fast_forward(10);
        assert_eq!(pool.remaining(), 0);
    }

    #[tokio::test]
    async fn load_missing_file_is_a_load_error() {
        let err = CodePool::load("/definitely/not/a/real/code-file.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CodeLoad(_)));
    }
}
