pub(super) use start::start;
pub(crate) use tile_coord::TileCoord;

mod cli;
mod server;
mod start;
mod tile_coord;
