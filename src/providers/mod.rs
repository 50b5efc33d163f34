pub mod coingecko;
pub mod seed;
pub mod util;
