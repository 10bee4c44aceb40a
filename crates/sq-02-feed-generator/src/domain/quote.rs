//! Simulated stock quote.
//!
//! Each tick moves the last price by a bounded random step around the
//! reference price, then rebuilds the book (bid/ask and quantities).

use rand::Rng;
use shared_types::FieldMap;

/// Display names of the simulated stocks, `item1` first.
pub const STOCK_NAMES: [&str; 30] = [
    "Anduct",
    "Ations Europe",
    "Bagies Consulting",
    "BAY Corporation",
    "CON Consulting",
    "Corcor PLC",
    "CVS Asia",
    "Datio PLC",
    "Dentems",
    "ELE Manufacturing",
    "Exacktum Systems",
    "Finapple",
    "Finance Bank",
    "Flosmaping",
    "Garcel",
    "Hapepix",
    "Hogni",
    "Ibertrust",
    "IMSI Ltd",
    "Jaktum Corp",
    "Jackowsky",
    "Jenbond",
    "Lomio",
    "Mapicos",
    "Meowpet",
    "Mossup",
    "Novatrip",
    "Pragmatic",
    "Qesa",
    "Zeolith",
];

/// Largest relative move of one tick.
const MAX_STEP: f64 = 0.01;

/// Prices never drift further than this from the reference.
const MAX_DRIFT: f64 = 0.5;

#[derive(Clone, Debug)]
pub struct StockQuote {
    name: &'static str,
    ref_price: f64,
    open_price: f64,
    last_price: f64,
    min: f64,
    max: f64,
    bid: f64,
    ask: f64,
    bid_quantity: u32,
    ask_quantity: u32,
    time: String,
}

impl StockQuote {
    /// A quote opened at `ref_price`, not traded yet.
    #[must_use]
    pub fn new(name: &'static str, ref_price: f64) -> Self {
        Self {
            name,
            ref_price,
            open_price: ref_price,
            last_price: ref_price,
            min: ref_price,
            max: ref_price,
            bid: ref_price,
            ask: ref_price,
            bid_quantity: 0,
            ask_quantity: 0,
            time: format_time(0),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn last_price(&self) -> f64 {
        self.last_price
    }

    /// Apply one random trade at `unix_secs`.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, unix_secs: u64) {
        let step = rng.gen_range(-MAX_STEP..=MAX_STEP);
        let floor = self.ref_price * (1.0 - MAX_DRIFT);
        let ceiling = self.ref_price * (1.0 + MAX_DRIFT);
        self.last_price = round_cents((self.last_price * (1.0 + step)).clamp(floor, ceiling));

        self.min = self.min.min(self.last_price);
        self.max = self.max.max(self.last_price);

        let spread = round_cents(self.last_price * rng.gen_range(0.0005..=0.002)).max(0.01);
        self.bid = round_cents(self.last_price - spread);
        self.ask = round_cents(self.last_price + spread);
        self.bid_quantity = rng.gen_range(1..=50) * 100;
        self.ask_quantity = rng.gen_range(1..=50) * 100;
        self.time = format_time(unix_secs);
    }

    /// Every field of the quote, as published on the bus.
    #[must_use]
    pub fn fields(&self) -> FieldMap {
        let pct_change = (self.last_price - self.ref_price) / self.ref_price * 100.0;

        FieldMap::from([
            ("stock_name".to_string(), self.name.to_string()),
            ("item_status".to_string(), "active".to_string()),
            ("time".to_string(), self.time.clone()),
            ("last_price".to_string(), format!("{:.2}", self.last_price)),
            ("ask".to_string(), format!("{:.2}", self.ask)),
            ("bid".to_string(), format!("{:.2}", self.bid)),
            ("bid_quantity".to_string(), self.bid_quantity.to_string()),
            ("ask_quantity".to_string(), self.ask_quantity.to_string()),
            ("pct_change".to_string(), format!("{pct_change:.2}")),
            ("min".to_string(), format!("{:.2}", self.min)),
            ("max".to_string(), format!("{:.2}", self.max)),
            ("ref_price".to_string(), format!("{:.2}", self.ref_price)),
            ("open_price".to_string(), format!("{:.2}", self.open_price)),
        ])
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `HH:MM:SS` of the day, UTC.
fn format_time(unix_secs: u64) -> String {
    let secs = unix_secs % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
