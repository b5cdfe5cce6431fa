//! Lunar-solar calendar conversion, almanac labels and lunar-anchored
//! recurrence expansion.

pub mod cache;
pub mod calendar;
pub mod date_info;
pub mod day_info;
pub mod festival;
pub mod ganzhi;
pub mod solar_term;
pub mod table;

pub use cache::LunarCalendarCache;
pub use calendar::{LunarCalendar, LunarInfo, lunar_to_solar};
pub use date_info::{LunarDateInfo, LunarOccurrences, LunarRecurrence};
pub use solar_term::SolarTerm;
