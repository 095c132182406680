//! Sort and persist the actor index.

use crate::content_index::ContentIndex;
use crate::error::{Error, Result};
use al_formats::{ActorInfo, Container};
use camino::Utf8Path;

/// Sort `hashes` ascending and reorder `actors` to match.
///
/// The sort is stable, so re-sorting an already sorted index changes nothing.
pub fn sort_actor_info(info: &mut ActorInfo) {
    if info.hashes.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }

    let mut pairs: Vec<(u32, _)> = std::mem::take(&mut info.hashes)
        .into_iter()
        .zip(std::mem::take(&mut info.actors))
        .collect();
    pairs.sort_by_key(|(hash, _)| *hash);

    let (hashes, actors): (Vec<u32>, Vec<_>) = pairs.into_iter().unzip();
    info.hashes = hashes;
    info.actors = actors;
}

/// Sort the index and overwrite `path` with it.
///
/// Any failure is reported as [`Error::Finalize`].
pub fn finalize(index: ContentIndex, path: &Utf8Path, container: &Container) -> Result<ActorInfo> {
    let wrap = |source: Error| Error::Finalize {
        path: path.to_owned(),
        source: Box::new(source),
    };

    let mut info = index.into_actor_info().map_err(wrap)?;
    sort_actor_info(&mut info);

    container
        .write_actor_info(path, &info)
        .map_err(|e| wrap(e.into()))?;

    tracing::info!("Wrote actor index with {} entries to {}", info.actors.len(), path);
    Ok(info)
}
