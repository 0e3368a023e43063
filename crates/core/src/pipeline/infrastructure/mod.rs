pub mod interval_scheduler;
