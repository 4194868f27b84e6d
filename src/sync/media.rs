// Copyright 2026 The Mnemo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Media manifest construction.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::Result;
use crate::sync::envelope::MediaManifest;

/// Hash every file under the media directory. Names are paths relative
/// to the directory with `/` separators, so manifests compare equal
/// across platforms. A missing directory is an empty manifest.
pub fn build_manifest(media_dir: &Path) -> Result<MediaManifest> {
    let mut manifest = MediaManifest::new();
    if !media_dir.is_dir() {
        return Ok(manifest);
    }
    for entry in WalkDir::new(media_dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(media_dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let contents = fs::read(entry.path())?;
        manifest.insert(name, blake3::hash(&contents).to_hex().to_string());
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_directory_is_empty_manifest() {
        let dir = tempdir().unwrap();
        let manifest = build_manifest(&dir.path().join("media")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_manifest_uses_relative_slashed_names() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.png"), b"aaa").unwrap();
        fs::write(dir.path().join("sub/b.mp3"), b"bbb").unwrap();
        let manifest = build_manifest(dir.path()).unwrap();
        assert_eq!(
            manifest.keys().collect::<Vec<_>>(),
            vec!["a.png", "sub/b.mp3"]
        );
        assert_eq!(manifest["a.png"], blake3::hash(b"aaa").to_hex().to_string());
    }

    #[test]
    fn test_same_contents_same_manifest() {
        let left = tempdir().unwrap();
        let right = tempdir().unwrap();
        for dir in [&left, &right] {
            fs::write(dir.path().join("x.png"), b"pixels").unwrap();
        }
        assert_eq!(
            build_manifest(left.path()).unwrap(),
            build_manifest(right.path()).unwrap()
        );
    }
}
