//! Pairing identity allocation and output path derivation.
//!
//! One Live Photo pairing is a still image and a movie that carry the same
//! embedded content identifier. The identifier and the derived basename are
//! allocated once per export invocation and never reused; the light pairing
//! gets its own independent identity with a distinguishing name prefix.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time::MediaTime;

/// Filename prefix for the light (reduced) pairing.
pub const LIGHT_PREFIX: &str = "light";

/// Lowercase extension for the staged pre-compression image.
const TEMP_IMAGE_EXT: &str = "tiff";
/// Lowercase extension for the staged trim-export movie.
const TEMP_VIDEO_EXT: &str = "mov";
/// Uppercase final extensions. The case split is cosmetic but load-bearing:
/// existing pairing detectors match finals by case-sensitive glob.
const FINAL_IMAGE_EXT: &str = "JPG";
const FINAL_VIDEO_EXT: &str = "MOV";

/// The shared identifier and filename stem of one pairing.
///
/// Immutable after allocation. The same `id` must be embedded verbatim in
/// both members of the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingIdentity {
    id: String,
    basename: String,
}

impl PairingIdentity {
    /// Allocate a fresh identity.
    ///
    /// The basename is `[prefix_]{base_name}-{poster}-{token}`; the token
    /// is a v4 UUID, treated as globally unique.
    pub fn allocate(base_name: &str, poster: MediaTime, prefix: Option<&str>) -> Self {
        let token = Uuid::new_v4().to_string();
        let stem = [base_name, &poster.to_filename_component(), &token].join("-");
        let basename = match prefix {
            Some(p) => format!("{}_{}", p, stem),
            None => stem,
        };
        Self {
            id: token,
            basename,
        }
    }

    /// Rebuild an identity from known parts.
    ///
    /// For custom allocators; `allocate` is the normal path.
    pub fn from_parts(id: impl Into<String>, basename: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            basename: basename.into(),
        }
    }

    /// The opaque content identifier embedded in both containers.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The filename stem shared by all four output paths.
    pub fn basename(&self) -> &str {
        &self.basename
    }
}

/// The four paths owned by one pairing's export job.
///
/// Derivation is pure; the caller checks pre-existence before any write
/// and aborts the pairing fail-closed if any path is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPathSet {
    pub temp_image: PathBuf,
    pub temp_video: PathBuf,
    pub final_image: PathBuf,
    pub final_video: PathBuf,
}

impl OutputPathSet {
    /// Derive the path set for an identity. Performs no I/O.
    pub fn resolve(identity: &PairingIdentity, temp_dir: &Path, final_dir: &Path) -> Self {
        let stem = identity.basename();
        Self {
            temp_image: temp_dir.join(format!("{}.{}", stem, TEMP_IMAGE_EXT)),
            temp_video: temp_dir.join(format!("{}.{}", stem, TEMP_VIDEO_EXT)),
            final_image: final_dir.join(format!("{}.{}", stem, FINAL_IMAGE_EXT)),
            final_video: final_dir.join(format!("{}.{}", stem, FINAL_VIDEO_EXT)),
        }
    }

    /// All four paths, temp first.
    pub fn all(&self) -> [&Path; 4] {
        [
            &self.temp_image,
            &self.temp_video,
            &self.final_image,
            &self.final_video,
        ]
    }

    /// First path that already exists on disk, if any.
    pub fn existing_path(&self) -> Option<&Path> {
        self.all().into_iter().find(|p| p.exists())
    }
}
