use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SirdError};

/// Run description read from a JSON document: model input, model files and
/// where outputs go.
pub struct RunContext<I = ()> {
    input_json: serde_json::Map<String, Value>,
    pub input: Option<I>,
    pub seed: u64,
    pub replicate: u64,
    pub files: HashMap<String, PathBuf>,
    output: Value,
}

impl RunContext {
    /// Splits a run document into its sections. Missing sections count as
    /// empty; sections of the wrong JSON type are rejected.
    pub fn from_json(mut data: Value) -> Result<Self> {
        if !data.is_object() {
            return Err(SirdError::invalid("run", "document must be a JSON object"));
        }

        let mut input_json = match data.get_mut("input").map(Value::take) {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(SirdError::invalid(
                    "input",
                    format!("expected an object of model parameters, found {other}"),
                ));
            }
        };
        let seed = take_count(&mut input_json, "seed")?;
        let replicate = take_count(&mut input_json, "replicate")?;

        let mut files = HashMap::new();
        if let Some(listing) = data.pointer("/model/files") {
            let listing = listing
                .as_object()
                .ok_or_else(|| SirdError::invalid("files", "expected an object of paths"))?;
            for (name, path) in listing {
                let path = path.as_str().ok_or_else(|| {
                    SirdError::invalid("files", format!("`{name}` is not a path string"))
                })?;
                files.insert(name.clone(), PathBuf::from(path));
            }
        }

        let output = data.get_mut("output").map(Value::take).unwrap_or(Value::Null);

        Ok(Self {
            input_json,
            input: None,
            seed,
            replicate,
            files,
            output,
        })
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Err(SirdError::EmptyInput);
        }
        let data: Value = serde_json::from_str(&raw)?;
        Self::from_json(data)
    }

    pub fn from_stdin() -> Result<Self> {
        Self::from_reader(io::stdin().lock())
    }

    /// Deserializes the input section into `I`. Every run's model seed is
    /// `seed + replicate`, so replicates of one input differ.
    pub fn with_input_type<I: DeserializeOwned>(self) -> Result<RunContext<I>> {
        let mut input_value = self.input_json.clone();
        input_value.insert(
            "seed".to_string(),
            Value::from(self.seed.wrapping_add(self.replicate)),
        );
        let input = serde_json::from_value(Value::Object(input_value))?;
        Ok(RunContext {
            input_json: self.input_json,
            input: Some(input),
            seed: self.seed,
            replicate: self.replicate,
            files: self.files,
            output: self.output,
        })
    }
}

impl<I: DeserializeOwned> RunContext<I> {
    pub fn load() -> Result<Self> {
        RunContext::from_stdin()?.with_input_type::<I>()
    }
}

impl<I> RunContext<I> {
    pub fn input_json(&self) -> &serde_json::Map<String, Value> {
        &self.input_json
    }

    pub fn file(&self, name: &str) -> Option<&Path> {
        self.files.get(name).map(PathBuf::as_path)
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        let output = &self.output;

        if output.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            return output.get("dir").and_then(|v| v.as_str()).map(PathBuf::from);
        }

        // Profiled output, "default" profile first
        let profile = output.get("profile").and_then(|v| v.as_object()).and_then(|profiles| {
            profiles
                .get("default")
                .or_else(|| profiles.values().next())
        })?;
        if profile.get("spec").and_then(|v| v.as_str()) == Some("filesystem") {
            return profile.get("dir").and_then(|v| v.as_str()).map(PathBuf::from);
        }
        None
    }

    /// Writes one CSV row per record, headers taken from the record's
    /// field names.
    pub fn write_csv<S: Serialize>(&self, filename: &str, records: &[S]) -> Result<()> {
        match self.output_dir() {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                let path = dir.join(filename);
                debug!(path = %path.display(), rows = records.len(), "writing csv");
                write_records(csv::Writer::from_path(path)?, records)
            }
            None => write_records(csv::Writer::from_writer(io::stdout()), records),
        }
    }
}

fn take_count(input: &mut serde_json::Map<String, Value>, key: &'static str) -> Result<u64> {
    match input.remove(key) {
        None => Ok(0),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| SirdError::invalid(key, format!("{v} is not a non-negative integer"))),
    }
}

fn write_records<W: Write, S: Serialize>(mut wtr: csv::Writer<W>, records: &[S]) -> Result<()> {
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
