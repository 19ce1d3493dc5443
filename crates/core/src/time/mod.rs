pub mod trip_dates;
