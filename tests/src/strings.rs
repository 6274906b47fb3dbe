use common::isa::Reg;

use vm_lib::Machine;

fn machine_with(prog: &[u8], data: &[(u32, u8)]) -> Machine {
    let mut machine = Machine::new();
    machine.load_program(prog).unwrap();
    for (addr, byte) in data {
        machine.get_state_mut().mem.write_byte(*addr, *byte).unwrap();
    }
    machine
}

#[test]
fn lodsb_reads_and_advances_si() {
    let mut machine = machine_with(&[0x24, 0xFF], &[(0x100, 0x41)]);
    machine.get_state_mut().reg_write(Reg::SI, 0x100);
    machine.run();
    assert_eq!(machine.reg_read(Reg::AX), 0x41);
    assert_eq!(machine.reg_read(Reg::SI), 0x101);
}

#[test]
fn stosb_writes_and_advances_di() {
    let mut machine = machine_with(&[0x25, 0xFF], &[]);
    machine.get_state_mut().reg_write(Reg::AX, 0x42);
    machine.get_state_mut().reg_write(Reg::DI, 0x200);
    machine.run();
    assert_eq!(machine.get_state().mem.read_byte(0x200).unwrap(), 0x42);
    assert_eq!(machine.reg_read(Reg::DI), 0x201);
}

#[test]
fn direction_flag_walks_backwards() {
    let mut machine = machine_with(&[0xFD, 0x24, 0xFF], &[(0x100, 0x41)]);
    machine.get_state_mut().reg_write(Reg::SI, 0x100);
    machine.run();
    assert_eq!(machine.reg_read(Reg::SI), 0x00FF);
}

#[test]
fn segment_registers_scale_string_addresses() {
    // ds:si = 0x0010:0x0000 -> physical 0x100.
    let mut machine = machine_with(&[0x24, 0xFF], &[(0x100, 0x99)]);
    machine.get_state_mut().reg_write(Reg::DS, 0x0010);
    machine.run();
    assert_eq!(machine.reg_read(Reg::AX), 0x99);
}

#[test]
fn rep_movsb_copies_a_block() {
    let data: Vec<(u32, u8)> = (0..4).map(|i| (0x100 + i, b'a' + i as u8)).collect();
    let mut machine = machine_with(&[0xF3, 0xA4, 0xFF], &data);
    machine.get_state_mut().reg_write(Reg::SI, 0x100);
    machine.get_state_mut().reg_write(Reg::DI, 0x200);
    machine.get_state_mut().reg_write(Reg::CX, 4);
    machine.run();
    for i in 0..4u32 {
        assert_eq!(
            machine.get_state().mem.read_byte(0x200 + i).unwrap(),
            b'a' + i as u8
        );
    }
    assert_eq!(machine.reg_read(Reg::CX), 0);
    assert_eq!(machine.reg_read(Reg::SI), 0x104);
}

#[test]
fn rep_scasb_stops_at_the_match() {
    let data = [(0x100, 1), (0x101, 2), (0x102, 3)];
    let mut machine = machine_with(&[0xF3, 0xAE, 0xFF], &data);
    machine.get_state_mut().reg_write(Reg::AX, 2);
    machine.get_state_mut().reg_write(Reg::DI, 0x100);
    machine.get_state_mut().reg_write(Reg::CX, 3);
    machine.run();
    // Stopped one past the matching byte with one element unexamined.
    assert_eq!(machine.reg_read(Reg::DI), 0x102);
    assert_eq!(machine.reg_read(Reg::CX), 1);
    assert!(machine.get_state().flags.get_zero());
}

#[test]
fn rep_cmpsb_runs_out_on_equal_buffers() {
    let mut data = Vec::new();
    for i in 0..3u32 {
        data.push((0x100 + i, 7));
        data.push((0x200 + i, 7));
    }
    let mut machine = machine_with(&[0xF3, 0xA6, 0xFF], &data);
    machine.get_state_mut().reg_write(Reg::SI, 0x100);
    machine.get_state_mut().reg_write(Reg::DI, 0x200);
    machine.get_state_mut().reg_write(Reg::CX, 3);
    machine.run();
    assert_eq!(machine.reg_read(Reg::CX), 0);
    assert!(machine.get_state().flags.get_zero());
}

#[test]
fn rep_cmpsb_stops_at_first_difference() {
    let data = [
        (0x100, 7),
        (0x101, 8),
        (0x200, 7),
        (0x201, 9),
    ];
    let mut machine = machine_with(&[0xF3, 0xA6, 0xFF], &data);
    machine.get_state_mut().reg_write(Reg::SI, 0x100);
    machine.get_state_mut().reg_write(Reg::DI, 0x200);
    machine.get_state_mut().reg_write(Reg::CX, 4);
    machine.run();
    assert_eq!(machine.reg_read(Reg::CX), 2);
    assert!(!machine.get_state().flags.get_zero());
}

#[test]
fn rep_with_zero_count_does_nothing() {
    let mut machine = machine_with(&[0xF3, 0xA4, 0xFF], &[(0x100, 5)]);
    machine.get_state_mut().reg_write(Reg::SI, 0x100);
    machine.get_state_mut().reg_write(Reg::DI, 0x200);
    machine.run();
    assert_eq!(machine.get_state().mem.read_byte(0x200).unwrap(), 0);
    assert_eq!(machine.reg_read(Reg::SI), 0x100);
}
