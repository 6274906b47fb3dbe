mod util;

mod alu;
mod control_flow;
mod debugger;
mod services;
mod stack;
mod strings;
