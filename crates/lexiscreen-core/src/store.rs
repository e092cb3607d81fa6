//! Result persistence.
//!
//! [`KeyValueStore`] is the raw flat-namespace repository (`get/set/keys`
//! over JSON strings). [`ResultStore`] layers the typed screening records on
//! top of it using the fixed key layout below. Writes overwrite; there are no
//! transactions and no reset operation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{ChecklistResult, HandwritingResult, TestId, TestScore, UserProfile};

/// testId → score.
pub const TEST_RESULTS_KEY: &str = "testResults";
/// testId → ISO-8601 completion time.
pub const TEST_DATES_KEY: &str = "testDates";
/// The latest [`ChecklistResult`].
pub const CHECKLIST_KEY: &str = "checklistResults";
/// The latest handwriting result wrapped as `{date, result}`.
pub const HANDWRITING_KEY: &str = "assessmentResults.handwriting";
/// The [`UserProfile`].
pub const USER_KEY: &str = "user";

// ---------------------------------------------------------------------------
// Raw key-value repository
// ---------------------------------------------------------------------------

/// A flat string-keyed store of JSON-encoded values.
pub trait KeyValueStore {
    /// Fetch the raw JSON stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store raw JSON under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store for tests and single-session hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// A store backed by a single pretty-printed JSON object on disk.
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, serde_json::Value>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read store from {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("failed to parse store JSON: {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened result store");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries).context("failed to serialize store")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write store to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace store at {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.to_string()))
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let parsed: serde_json::Value = serde_json::from_str(&value)
            .with_context(|| format!("value for {key} is not valid JSON"))?;
        self.entries.insert(key.to_string(), parsed);
        self.flush()
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Typed result store
// ---------------------------------------------------------------------------

/// The stored shape of the handwriting key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandwritingEntry {
    pub date: DateTime<Utc>,
    pub result: HandwritingResult,
}

/// Everything persisted, read in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSnapshot {
    pub test_results: BTreeMap<TestId, u8>,
    pub test_dates: BTreeMap<TestId, DateTime<Utc>>,
    pub checklist: Option<ChecklistResult>,
    pub handwriting: Option<HandwritingResult>,
    pub profile: Option<UserProfile>,
}

impl ResultSnapshot {
    /// True when no score of any kind has been recorded.
    pub fn has_no_scores(&self) -> bool {
        self.test_results.is_empty() && self.checklist.is_none() && self.handwriting.is_none()
    }

    /// Tests in administration order that have no stored score.
    pub fn pending_tests(&self) -> Vec<TestId> {
        TestId::ALL
            .into_iter()
            .filter(|id| !self.test_results.contains_key(id))
            .collect()
    }
}

/// Typed access to screening records over any [`KeyValueStore`].
#[derive(Debug)]
pub struct ResultStore<S> {
    inner: S,
}

impl<S: KeyValueStore> ResultStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Serialize `record` under `key`, overwriting.
    pub fn save<T: Serialize>(&mut self, key: &str, record: &T) -> Result<()> {
        let json = serde_json::to_string(record)
            .with_context(|| format!("failed to serialize record for {key}"))?;
        self.inner.set(key, json)?;
        tracing::debug!(key, "saved record");
        Ok(())
    }

    /// Read and decode the record under `key`.
    ///
    /// A record that no longer decodes is logged and treated as absent.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.inner.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed record");
                Ok(None)
            }
        }
    }

    /// Record a test score and its date, replacing any earlier attempt.
    ///
    /// Both maps are built before anything is written. The date is written
    /// first, so a failed write never leaves a new score without its date;
    /// at worst the previous score is kept alongside the newer date.
    pub fn save_test_score(&mut self, score: &TestScore) -> Result<()> {
        let mut results = self.load_test_map::<u8>(TEST_RESULTS_KEY)?;
        results.insert(score.test_id, score.value);
        let mut dates = self.load_test_map::<DateTime<Utc>>(TEST_DATES_KEY)?;
        dates.insert(score.test_id, score.timestamp);

        self.save(TEST_DATES_KEY, &keyed(&dates))?;
        self.save(TEST_RESULTS_KEY, &keyed(&results))?;

        tracing::info!(test = %score.test_id, value = score.value, "test score saved");
        Ok(())
    }

    pub fn save_checklist(&mut self, result: &ChecklistResult) -> Result<()> {
        self.save(CHECKLIST_KEY, result)?;
        tracing::info!(overall_score = result.overall_score, "checklist saved");
        Ok(())
    }

    pub fn save_handwriting(&mut self, result: &HandwritingResult) -> Result<()> {
        let entry = HandwritingEntry {
            date: result.date,
            result: result.clone(),
        };
        self.save(HANDWRITING_KEY, &entry)
    }

    pub fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.save(USER_KEY, profile)
    }

    pub fn load_profile(&self) -> Result<Option<UserProfile>> {
        self.load(USER_KEY)
    }

    /// Read every record in one snapshot.
    pub fn load_all(&self) -> Result<ResultSnapshot> {
        Ok(ResultSnapshot {
            test_results: self
                .load_test_map::<u8>(TEST_RESULTS_KEY)?
                .into_iter()
                .filter(|(id, value)| {
                    let ok = *value <= 100;
                    if !ok {
                        tracing::warn!(test = %id, value, "ignoring out-of-range score");
                    }
                    ok
                })
                .collect(),
            test_dates: self.load_test_map(TEST_DATES_KEY)?,
            checklist: self.load(CHECKLIST_KEY)?,
            handwriting: self
                .load::<HandwritingEntry>(HANDWRITING_KEY)?
                .map(|entry| entry.result),
            profile: self.load_profile()?,
        })
    }

    /// Decode a testId-keyed map entry by entry, skipping what no longer parses.
    fn load_test_map<V: DeserializeOwned>(&self, key: &str) -> Result<BTreeMap<TestId, V>> {
        let raw: BTreeMap<String, serde_json::Value> = self.load(key)?.unwrap_or_default();
        let mut map = BTreeMap::new();
        for (name, value) in raw {
            let Ok(id) = name.parse::<TestId>() else {
                tracing::warn!(key, entry = %name, "ignoring unknown test id");
                continue;
            };
            match serde_json::from_value(value) {
                Ok(v) => {
                    map.insert(id, v);
                }
                Err(e) => tracing::warn!(key, entry = %name, error = %e, "ignoring malformed entry"),
            }
        }
        Ok(map)
    }
}

/// Re-key a test map by storage key so the JSON layout does not depend on
/// enum serialization.
fn keyed<V: Clone>(map: &BTreeMap<TestId, V>) -> BTreeMap<&'static str, V> {
    map.iter().map(|(id, v)| (id.key(), v.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeGroup, SubScore};

    fn score(test: TestId, value: u32) -> TestScore {
        TestScore::new(test, value, Utc::now()).unwrap()
    }

    fn checklist(overall: u8) -> ChecklistResult {
        ChecklistResult {
            date: Utc::now(),
            age_group: AgeGroup::SchoolAge,
            overall_score: overall,
            category_scores: BTreeMap::from([("reading".to_string(), overall)]),
        }
    }

    fn handwriting(overall: u8) -> HandwritingResult {
        let sub = |score| SubScore {
            score,
            description: String::new(),
        };
        HandwritingResult {
            date: Utc::now(),
            letter_formation: sub(4),
            letter_spacing: sub(4),
            line_alignment: sub(4),
            letter_reversals: sub(2),
            overall_score: overall,
        }
    }

    /// Delegates to a [`MemoryStore`] but refuses writes to one key.
    struct RefusingStore {
        inner: MemoryStore,
        refused: &'static str,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<()> {
            anyhow::ensure!(key != self.refused, "write to {key} refused");
            self.inner.set(key, value)
        }

        fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys()
        }
    }

    #[test]
    fn failed_date_write_keeps_previous_score() {
        let mut inner = ResultStore::new(MemoryStore::new());
        inner.save_test_score(&score(TestId::Ran, 40)).unwrap();
        let before = inner.load_all().unwrap();

        let mut store = ResultStore::new(RefusingStore {
            inner: inner.inner().clone(),
            refused: TEST_DATES_KEY,
        });
        assert!(store.save_test_score(&score(TestId::Ran, 90)).is_err());

        let after = store.load_all().unwrap();
        assert_eq!(after.test_results, before.test_results);
        assert_eq!(after.test_dates, before.test_dates);
    }

    #[test]
    fn failed_score_write_leaves_previous_score() {
        let mut store = ResultStore::new(RefusingStore {
            inner: MemoryStore::new(),
            refused: TEST_RESULTS_KEY,
        });
        assert!(store.save_test_score(&score(TestId::Phonological, 70)).is_err());

        let snapshot = store.load_all().unwrap();
        assert!(snapshot.test_results.is_empty());
        assert!(snapshot.has_no_scores());
    }

    #[test]
    fn retake_overwrites_score() {
        let mut store = ResultStore::new(MemoryStore::new());
        store.save_test_score(&score(TestId::Ran, 40)).unwrap();
        store.save_test_score(&score(TestId::Ran, 75)).unwrap();
        store.save_test_score(&score(TestId::Phonological, 60)).unwrap();

        let snapshot = store.load_all().unwrap();
        assert_eq!(snapshot.test_results.len(), 2);
        assert_eq!(snapshot.test_results[&TestId::Ran], 75);
        assert!(snapshot.test_dates.contains_key(&TestId::Ran));
    }

    #[test]
    fn persisted_layout_uses_flat_keys() {
        let mut store = ResultStore::new(MemoryStore::new());
        store.save_test_score(&score(TestId::WorkingMemory, 80)).unwrap();
        store.save_checklist(&checklist(50)).unwrap();
        store.save_handwriting(&handwriting(88)).unwrap();
        store
            .save_profile(&UserProfile {
                name: "Ada".into(),
                ..Default::default()
            })
            .unwrap();

        let kv = store.inner();
        assert_eq!(
            kv.keys().unwrap(),
            vec![
                HANDWRITING_KEY,
                CHECKLIST_KEY,
                TEST_DATES_KEY,
                TEST_RESULTS_KEY,
                USER_KEY
            ]
        );
        assert_eq!(
            kv.get(TEST_RESULTS_KEY).unwrap().unwrap(),
            r#"{"workingMemory":80}"#
        );
        let hw: serde_json::Value =
            serde_json::from_str(&kv.get(HANDWRITING_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(hw["result"]["overallScore"], 88);
        assert!(hw["date"].is_string());
    }

    #[test]
    fn empty_store_snapshot() {
        let store = ResultStore::new(MemoryStore::new());
        let snapshot = store.load_all().unwrap();
        assert!(snapshot.has_no_scores());
        assert_eq!(snapshot.pending_tests().len(), 6);
        assert!(snapshot.profile.is_none());
    }

    #[test]
    fn malformed_records_read_as_absent() {
        let mut kv = MemoryStore::new();
        kv.set(CHECKLIST_KEY, "{\"overallScore\": \"lots\"}".into())
            .unwrap();
        kv.set(
            TEST_RESULTS_KEY,
            r#"{"ran": 70, "spelling": 40, "phonological": "high", "directionSense": 250}"#.into(),
        )
        .unwrap();
        let store = ResultStore::new(kv);

        let snapshot = store.load_all().unwrap();
        assert!(snapshot.checklist.is_none());
        assert_eq!(
            snapshot.test_results,
            BTreeMap::from([(TestId::Ran, 70)])
        );
    }

    #[test]
    fn json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("results.json");

        let mut store = ResultStore::new(JsonFileStore::open(&path).unwrap());
        store.save_test_score(&score(TestId::AudioDiscrimination, 80)).unwrap();
        store.save_checklist(&checklist(33)).unwrap();
        drop(store);

        let reopened = ResultStore::new(JsonFileStore::open(&path).unwrap());
        let snapshot = reopened.load_all().unwrap();
        assert_eq!(snapshot.test_results[&TestId::AudioDiscrimination], 80);
        assert_eq!(snapshot.checklist.unwrap().overall_score, 33);

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk[TEST_RESULTS_KEY]["audioDiscrimination"], 80);
    }

    #[test]
    fn json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }

    #[test]
    fn json_file_store_rejects_non_json_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut kv = JsonFileStore::open(&dir.path().join("results.json")).unwrap();
        assert!(kv.set("user", "not json".into()).is_err());
    }
}
