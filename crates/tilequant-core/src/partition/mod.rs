//! Grouping tiles into a bounded number of shared palettes.
//!
//! Every tile needs the set of its distinct (non-transparent) colors to be
//! contained in the palette it is assigned. The partitioner packs those
//! sets greedily in row-major tile order:
//!
//! 1. a tile joins the open palette that needs the fewest new colors, then
//!    the one that ends up smallest, then the lowest index;
//! 2. if no open palette can take it without exceeding the capacity, a new
//!    palette is opened while fewer than `num_palettes` exist;
//! 3. otherwise the pass fails.
//!
//! Greedy packing is a heuristic and can miss groupings an exhaustive
//! search would find. When the pass at full capacity fails, tighter
//! capacities are tried down to the size of the largest tile set, which
//! spreads colors over more palettes. Any grouping found this way also
//! fits the full capacity, and it makes success monotone: more palettes or
//! more colors per palette never turn a success into a failure.

use tracing::{debug, trace};

use crate::api::PartitionError;
use crate::color::Rgb;
use crate::image::{Image, TileGrid};

/// Palette index per tile, indexed by row-major tile index.
pub type PaletteAssignment = Vec<usize>;

/// Outcome of a successful partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Colors of each palette in first-seen order, without any reserved slot
    pub palettes: Vec<Vec<Rgb>>,
    /// Palette used by each tile
    pub assignment: PaletteAssignment,
}

impl Partition {
    /// Colors of the palette assigned to tile `tile`. Empty for a tile
    /// outside the assignment.
    pub fn palette_for_tile(&self, tile: usize) -> &[Rgb] {
        self.assignment
            .get(tile)
            .and_then(|&palette| self.palettes.get(palette))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Decides whether an image's tiles fit into the palette constraints.
#[derive(Debug, Clone, Copy)]
pub struct TilePartitioner {
    grid: TileGrid,
    num_palettes: usize,
    colors_per_palette: usize,
    reserved: usize,
}

impl TilePartitioner {
    /// Create a partitioner for `num_palettes` palettes of
    /// `colors_per_palette` entries, `reserved` of which are not usable for
    /// tile colors.
    pub fn new(grid: TileGrid, num_palettes: usize, colors_per_palette: usize, reserved: usize) -> Self {
        Self {
            grid,
            num_palettes,
            colors_per_palette,
            reserved,
        }
    }

    /// Usable colors per palette.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.colors_per_palette.saturating_sub(self.reserved)
    }

    /// The tile grid being partitioned.
    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Distinct non-transparent colors of every tile in first-seen order.
    pub fn tile_color_sets(&self, image: &Image) -> Vec<Vec<Rgb>> {
        self.grid
            .tiles()
            .map(|coord| {
                let rect = self.grid.tile_rect(coord);
                let mut colors = Vec::new();
                for y in rect.y..rect.y + rect.height {
                    for x in rect.x..rect.x + rect.width {
                        if image.is_transparent(x, y) {
                            continue;
                        }
                        let color = image.pixel(x, y);
                        if !colors.contains(&color) {
                            colors.push(color);
                        }
                    }
                }
                colors
            })
            .collect()
    }

    /// Group the tiles of `image` into palettes.
    ///
    /// # Errors
    ///
    /// - [`PartitionError::TileTooComplex`] for the first tile whose color
    ///   set exceeds [`capacity`](Self::capacity)
    /// - [`PartitionError::PaletteBudgetExceeded`] if no tighter capacity
    ///   helps either
    pub fn partition(&self, image: &Image) -> Result<Partition, PartitionError> {
        let sets = self.tile_color_sets(image);
        self.partition_sets(&sets)
    }

    /// Same as [`partition`](Self::partition) on precomputed tile sets.
    pub fn partition_sets(&self, sets: &[Vec<Rgb>]) -> Result<Partition, PartitionError> {
        let capacity = self.capacity();

        let mut largest = 0;
        for (tile, set) in sets.iter().enumerate() {
            if set.len() > capacity {
                debug!(tile, colors = set.len(), capacity, "tile too complex");
                return Err(PartitionError::TileTooComplex {
                    tile,
                    colors: set.len(),
                    capacity,
                });
            }
            largest = largest.max(set.len());
        }

        let err = match self.pack(sets, capacity) {
            Ok(partition) => return Ok(partition),
            Err(err) => err,
        };

        for tighter in (largest.max(1)..capacity).rev() {
            debug!(capacity = tighter, "retrying with tighter palettes");
            if let Ok(partition) = self.pack(sets, tighter) {
                return Ok(partition);
            }
        }
        Err(err)
    }

    /// One greedy pass with palettes limited to `capacity` colors.
    fn pack(&self, sets: &[Vec<Rgb>], capacity: usize) -> Result<Partition, PartitionError> {
        let mut palettes: Vec<Vec<Rgb>> = Vec::new();
        let mut assignment = vec![0; sets.len()];
        let mut deferred = Vec::new();

        for (tile, set) in sets.iter().enumerate() {
            if set.is_empty() {
                deferred.push(tile);
                continue;
            }

            let best = palettes
                .iter()
                .enumerate()
                .filter_map(|(i, palette)| {
                    let new = set.iter().filter(|c| !palette.contains(c)).count();
                    let size = palette.len() + new;
                    (size <= capacity).then_some((new, size, i))
                })
                .min();

            let index = match best {
                Some((_, _, i)) => {
                    for &color in set {
                        if !palettes[i].contains(&color) {
                            palettes[i].push(color);
                        }
                    }
                    i
                }
                None if palettes.len() < self.num_palettes => {
                    palettes.push(set.clone());
                    palettes.len() - 1
                }
                None => {
                    debug!(
                        tile,
                        capacity,
                        palettes = self.num_palettes,
                        "palette budget exceeded"
                    );
                    return Err(PartitionError::PaletteBudgetExceeded {
                        tile,
                        palettes: self.num_palettes,
                    });
                }
            };
            trace!(tile, palette = index, size = palettes[index].len(), "tile placed");
            assignment[tile] = index;
        }

        // Tiles without colors fit anywhere; give them the smallest palette.
        if let Some(smallest) = (0..palettes.len()).min_by_key(|&i| (palettes[i].len(), i)) {
            for tile in deferred {
                assignment[tile] = smallest;
            }
        }

        debug!(capacity, palettes = palettes.len(), "partition pass succeeded");
        Ok(Partition {
            palettes,
            assignment,
        })
    }
}
