use anyhow::{bail, Context, Result};
use docsearch_core::{DocId, DocumentStatus, SearchEngine};
use serde::Deserialize;
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One document record as it appears in a `.json` or `.jsonl` input file.
#[derive(Debug, Clone, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

/// Outcome of loading a batch of input files into an engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub added: usize,
    pub skipped: usize,
}

/// Input files under `input`: the path itself, or every `.json`/`.jsonl` file
/// below it when it is a directory, in a stable order.
pub fn collect_input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(input = %input.display(), error = %err, "skipping unreadable path");
                    continue;
                }
            };
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

/// Parse every record of one file. JSONL files hold one object per line;
/// JSON files hold an array of objects or a single object.
pub fn read_documents(file: &Path) -> Result<Vec<InputDoc>> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        let mut docs = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: InputDoc = serde_json::from_str(&line)
                .with_context(|| format!("{}:{}", file.display(), line_no + 1))?;
            docs.push(doc);
        }
        return Ok(docs);
    }
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<InputDoc>, _>>()?,
        value @ serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => bail!("{}: expected a JSON array or object at the top level", file.display()),
    };
    Ok(docs)
}

/// Add every record found under `input`. Records the engine rejects are
/// logged and skipped; unreadable files abort the load.
pub fn load_documents(engine: &mut SearchEngine, input: &Path) -> Result<LoadStats> {
    let mut stats = LoadStats::default();
    for file in collect_input_files(input) {
        for doc in read_documents(&file)? {
            match engine.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
                Ok(()) => stats.added += 1,
                Err(err) => {
                    tracing::warn!(file = %file.display(), id = doc.id, error = %err, "skipping document");
                    stats.skipped += 1;
                }
            }
        }
    }
    tracing::info!(added = stats.added, skipped = stats.skipped, input = %input.display(), "documents loaded");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_json_and_jsonl_and_skips_rejects() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"id\": 1, \"text\": \"white cat\", \"ratings\": [1, 2]}\n\n{\"id\": 2, \"text\": \"black dog\", \"status\": \"BANNED\"}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.json"),
            "[{\"id\": 3, \"text\": \"grey cat\"}, {\"id\": 1, \"text\": \"duplicate\"}, {\"id\": -4, \"text\": \"negative\"}]",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut engine = SearchEngine::from_stop_words_text("").unwrap();
        let stats = load_documents(&mut engine, dir.path()).unwrap();
        assert_eq!(stats, LoadStats { added: 3, skipped: 2 });
        assert_eq!(engine.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(engine.find_top_documents("cat").unwrap().len(), 2);
        assert_eq!(engine.find_top_documents_by_status("dog", DocumentStatus::Banned).unwrap()[0].id, 2);
    }

    #[test]
    fn single_object_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.json");
        fs::write(&path, "{\"id\": 9, \"text\": \"lonely document\"}").unwrap();
        let docs = read_documents(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].status, DocumentStatus::Actual);
        assert!(docs[0].ratings.is_empty());
    }

    #[test]
    fn malformed_line_reports_location() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{\"id\": 1, \"text\": \"ok\"}\nnot json\n").unwrap();
        let err = read_documents(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.jsonl:2"));
    }

    #[test]
    fn scalar_top_level_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scalar.json");
        fs::write(&path, "42").unwrap();
        let err = read_documents(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("scalar.json"), "{message}");
        assert!(message.contains("expected a JSON array or object"), "{message}");

        let mut engine = SearchEngine::default();
        assert!(load_documents(&mut engine, dir.path()).is_err());
        assert_eq!(engine.document_count(), 0);
    }
}
