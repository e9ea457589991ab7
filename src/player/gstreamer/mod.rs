pub mod bus_handler;
pub mod sink_factory;
