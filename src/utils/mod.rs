pub(crate) mod date;
pub(crate) mod logging;
pub(crate) mod timezone;

pub(crate) use date::{first_of_month, format_datetime, last_of_month, parse_date, parse_datetime};
pub(crate) use logging::init_logging;
pub(crate) use timezone::Timezone;
