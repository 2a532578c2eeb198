//! Ware production time series and the building census.

use crate::coords::{Coords, PlayerNumber};
use crate::error::GameDataError;
use crate::fileio::{FieldRead, FieldWrite, FileError};
use crate::tribe::{BuildingIndex, TribeDescr, WareIndex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum StatisticsError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Data(#[from] GameDataError),
    #[error("Cannot save {count} {what}, at most {max} fit", max = u16::MAX)]
    TooMany { what: &'static str, count: usize },
}

/// Per-ware production counters.
///
/// `current` accumulates until the next sample, which appends it to the
/// ware's series and resets it. All series always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WareStatistics {
    current: Vec<u32>,
    series: Vec<VecDeque<u32>>,
}

impl WareStatistics {
    pub fn new(nr_wares: usize) -> Self {
        Self {
            current: vec![0; nr_wares],
            series: vec![VecDeque::new(); nr_wares],
        }
    }

    pub fn nr_wares(&self) -> usize {
        self.current.len()
    }

    /// Number of samples taken so far (bounded by the retention).
    pub fn nr_samples(&self) -> usize {
        self.series.first().map_or(0, VecDeque::len)
    }

    pub fn ware_produced(&mut self, ware: WareIndex) -> bool {
        match self.current.get_mut(ware as usize) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn current(&self, ware: WareIndex) -> Option<u32> {
        self.current.get(ware as usize).copied()
    }

    pub fn series(&self, ware: WareIndex) -> Option<&VecDeque<u32>> {
        self.series.get(ware as usize)
    }

    /// Flush the current counters into the series. With a retention limit,
    /// the oldest samples are dropped beyond it.
    pub fn sample(&mut self, retention: Option<usize>) {
        for (series, current) in self.series.iter_mut().zip(self.current.iter_mut()) {
            series.push_back(*current);
            *current = 0;
            if let Some(limit) = retention {
                while series.len() > limit {
                    series.pop_front();
                }
            }
        }
    }

    /// Read a statistics block.
    ///
    /// Version 0 stores wares by position and is discarded when the ware
    /// count does not match the tribe. Version 1 stores ware names; unknown
    /// names are skipped.
    #[instrument(skip(self, fr, tribe))]
    pub fn read(
        &mut self,
        fr: &mut impl FieldRead,
        version: u32,
        tribe: &TribeDescr,
        player: PlayerNumber,
    ) -> Result<(), StatisticsError> {
        match version {
            1 => {
                let nr_wares = fr.unsigned16()?;
                let nr_entries = fr.unsigned16()? as usize;
                for series in &mut self.series {
                    series.clear();
                    series.resize(nr_entries, 0);
                }
                for _ in 0..nr_wares {
                    let name = fr.c_string()?;
                    let Some(index) = tribe.ware_index(&name) else {
                        log::warn!("Player {} statistics: unknown ware name {}", player, name);
                        for _ in 0..=nr_entries {
                            fr.unsigned32()?;
                        }
                        continue;
                    };
                    let index = index as usize;
                    if index >= self.current.len() {
                        return Err(GameDataError::CorruptStatistics(format!(
                            "ware {} out of range",
                            name
                        ))
                        .into());
                    }
                    self.current[index] = fr.unsigned32()?;
                    for entry in 0..nr_entries {
                        self.series[index][entry] = fr.unsigned32()?;
                    }
                }
                Ok(())
            }
            0 => {
                let nr_wares = fr.unsigned16()? as usize;
                let nr_entries = fr.unsigned16()? as usize;
                if nr_wares == 0 {
                    return Ok(());
                }
                if nr_wares == tribe.nr_wares() && nr_wares == self.current.len() {
                    for i in 0..nr_wares {
                        self.current[i] = fr.unsigned32()?;
                        let series = &mut self.series[i];
                        series.clear();
                        for _ in 0..nr_entries {
                            series.push_back(fr.unsigned32()?);
                        }
                    }
                } else {
                    log::warn!(
                        "Statistics for player {} ({}) has {} ware types (should be {}). \
                         Statistics will be discarded.",
                        player,
                        tribe.name(),
                        nr_wares,
                        tribe.nr_wares()
                    );
                    for _ in 0..nr_wares * (nr_entries + 1) {
                        fr.unsigned32()?;
                    }
                }
                Ok(())
            }
            other => Err(GameDataError::UnsupportedStatisticsVersion(other).into()),
        }
    }

    /// Write a version 1 statistics block.
    pub fn write(&self, fw: &mut impl FieldWrite, tribe: &TribeDescr) -> Result<(), StatisticsError> {
        let nr_wares = u16::try_from(self.current.len()).map_err(|_| StatisticsError::TooMany {
            what: "wares",
            count: self.current.len(),
        })?;
        let nr_samples = u16::try_from(self.nr_samples()).map_err(|_| StatisticsError::TooMany {
            what: "samples",
            count: self.nr_samples(),
        })?;
        fw.unsigned16(nr_wares)?;
        fw.unsigned16(nr_samples)?;
        for (i, (current, series)) in self.current.iter().zip(&self.series).enumerate() {
            let name = tribe
                .ware(i as WareIndex)
                .map(|w| w.name.as_str())
                .unwrap_or_default();
            fw.c_string(name)?;
            fw.unsigned32(*current)?;
            for &entry in series {
                fw.unsigned32(entry)?;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CensusError {
    #[error(
        "A building should be removed at {0}, but nothing is known about this building!"
    )]
    UnknownBuilding(Coords),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingStats {
    pub position: Coords,
    pub is_construction_site: bool,
}

/// Positions of a player's buildings, grouped by building type.
/// Construction sites are listed under the type they will become.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingCensus {
    by_type: Vec<Vec<BuildingStats>>,
}

impl BuildingCensus {
    pub fn add(&mut self, descr: BuildingIndex, position: Coords, is_construction_site: bool) {
        let index = descr as usize;
        if self.by_type.len() <= index {
            self.by_type.resize(index + 1, Vec::new());
        }
        self.by_type[index].push(BuildingStats {
            position,
            is_construction_site,
        });
    }

    pub fn remove(&mut self, descr: BuildingIndex, position: Coords) -> Result<(), CensusError> {
        let stats = self
            .by_type
            .get_mut(descr as usize)
            .ok_or(CensusError::UnknownBuilding(position))?;
        let at = stats
            .iter()
            .position(|s| s.position == position)
            .ok_or(CensusError::UnknownBuilding(position))?;
        stats.remove(at);
        Ok(())
    }

    pub fn stats(&self, descr: BuildingIndex) -> &[BuildingStats] {
        self.by_type
            .get(descr as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.by_type.iter().map(Vec::len).sum()
    }
}
