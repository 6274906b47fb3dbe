use std::sync::{Arc, Mutex};

use common::isa::Reg;

use vm_lib::debug::DebugView;
use vm_lib::{DebugHandler, ExecRet, Machine};

// Keeps every view handed out at a pause so the test can inspect it after
// the run.
struct RecordingDebug(Arc<Mutex<Vec<(String, Vec<String>)>>>);

impl DebugHandler for RecordingDebug {
    fn on_breakpoint(&mut self, view: &DebugView) {
        self.0
            .lock()
            .unwrap()
            .push((view.registers.clone(), view.disassembly.clone()));
    }
}

#[test]
fn breakpoint_pause_hands_the_handler_a_machine_view() {
    let pauses = Arc::new(Mutex::new(Vec::new()));
    let mut machine = Machine::new();
    machine.set_debug_handler(RecordingDebug(pauses.clone()));
    machine.set_breakpoint(0x0004);
    machine
        .load_program(&[
            0x01, 0x00, 0x00, 0x05, // mov ax, 5
            0x0E, 0x01, // inc bx (breakpoint here)
            0xFF,
        ])
        .unwrap();
    machine.run();

    let pauses = pauses.lock().unwrap();
    assert_eq!(pauses.len(), 1);
    let (registers, disassembly) = &pauses[0];
    assert!(registers.contains("ax: 0005"));
    assert_eq!(disassembly[0], "0004: inc bx");
    // Execution resumed after the pause.
    assert_eq!(machine.reg_read(Reg::BX), 1);
}

#[test]
fn breakpoints_are_ignored_outside_debug_mode() {
    let pauses = Arc::new(Mutex::new(Vec::new()));
    let mut machine = Machine::new();
    machine.set_debug_handler(RecordingDebug(pauses.clone()));
    machine.get_state_mut().breakpoints.insert(0x0000);
    machine.load_program(&[0xFF]).unwrap();
    machine.run();
    assert!(pauses.lock().unwrap().is_empty());
}

#[test]
fn single_step_reports_each_instruction_address() {
    let mut machine = Machine::new();
    machine
        .load_program(&[
            0x01, 0x00, 0x00, 0x05, // mov ax, 5
            0x0E, 0x01, // inc bx
            0xFF,
        ])
        .unwrap();
    assert_eq!(machine.single_step(), (0x0000, ExecRet::Ok));
    assert_eq!(machine.single_step(), (0x0004, ExecRet::Ok));
    assert_eq!(machine.single_step(), (0x0006, ExecRet::Halt));
    assert_eq!(machine.reg_read(Reg::AX), 5);
    assert_eq!(machine.reg_read(Reg::BX), 1);
}
