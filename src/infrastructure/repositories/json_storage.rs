use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

// Save to JSON
pub fn save_json<T: Serialize>(value: &T, file_path: &str) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut file = fs::File::create(file_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

// Load from JSON; a missing file is an empty store
pub fn load_json<T: DeserializeOwned + Default>(file_path: &str) -> io::Result<T> {
    if !Path::new(file_path).exists() {
        return Ok(T::default());
    }
    let data = fs::read_to_string(file_path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}
