use crate::util::run;

use common::isa::Reg;

#[test]
fn mov_imm_hits_each_general_register() {
    let machine = run(&[
        0x01, 0x00, 0x11, 0x11, // mov ax, 0x1111
        0x01, 0x01, 0x22, 0x22, // mov bx, 0x2222
        0x01, 0x02, 0x33, 0x33, // mov cx, 0x3333
        0x01, 0x03, 0x44, 0x44, // mov dx, 0x4444
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0x1111);
    assert_eq!(machine.reg_read(Reg::BX), 0x2222);
    assert_eq!(machine.reg_read(Reg::CX), 0x3333);
    assert_eq!(machine.reg_read(Reg::DX), 0x4444);
}

#[test]
fn mov_ax_imm_is_little_endian() {
    let machine = run(&[0xB8, 0x34, 0x12, 0xFF]);
    assert_eq!(machine.reg_read(Reg::AX), 0x1234);
}

#[test]
fn add_wraps_and_reports_carry() {
    let machine = run(&[
        0x01, 0x00, 0xFE, 0xFF, // mov ax, 0xFEFF
        0x01, 0x01, 0x02, 0x00, // mov bx, 0x0200
        0x02, 0x00, 0x01, // add ax, bx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0x00FF);
    assert!(machine.get_state().flags.get_carry());
    assert!(!machine.get_state().flags.get_zero());
}

#[test]
fn sub_below_zero_sets_carry_and_sign() {
    let machine = run(&[
        0x01, 0x00, 0x00, 0x01, // mov ax, 1
        0x01, 0x01, 0x00, 0x02, // mov bx, 2
        0x04, 0x00, 0x01, // sub ax, bx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0xFFFF);
    assert!(machine.get_state().flags.get_carry());
    assert!(machine.get_state().flags.get_sign());
}

#[test]
fn adc_propagates_the_carry_chain() {
    // Low halves overflow, the carry feeds the high-half add.
    let machine = run(&[
        0x01, 0x00, 0xFF, 0xFF, // mov ax, 0xFFFF
        0x01, 0x01, 0x00, 0x01, // mov bx, 1
        0x01, 0x02, 0x00, 0x05, // mov cx, 5
        0x01, 0x03, 0x00, 0x00, // mov dx, 0
        0x02, 0x00, 0x01, // add ax, bx (carry out)
        0x20, 0x02, 0x03, // adc cx, dx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0);
    assert_eq!(machine.reg_read(Reg::CX), 6);
}

#[test]
fn sbb_borrows() {
    let machine = run(&[
        0x23, // stc
        0x01, 0x00, 0x00, 0x05, // mov ax, 5
        0x01, 0x01, 0x00, 0x02, // mov bx, 2
        0x21, 0x00, 0x01, // sbb ax, bx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 2);
}

#[test]
fn cmp_only_touches_flags() {
    let machine = run(&[
        0x01, 0x00, 0x00, 0x07, // mov ax, 7
        0x01, 0x01, 0x00, 0x07, // mov bx, 7
        0x0A, 0x00, 0x01, // cmp ax, bx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 7);
    assert!(machine.get_state().flags.get_zero());
}

#[test]
fn logic_ops() {
    let machine = run(&[
        0x01, 0x00, 0xF0, 0xF0, // mov ax, 0xF0F0
        0x01, 0x01, 0xFF, 0x00, // mov bx, 0xFF00
        0x01, 0x02, 0xF0, 0xF0, // mov cx, 0xF0F0
        0x01, 0x03, 0x0F, 0x0F, // mov dx, 0x0F0F
        0x05, 0x00, 0x01, // and ax, bx
        0x07, 0x02, 0x03, // or cx, dx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0xF000);
    assert_eq!(machine.reg_read(Reg::CX), 0xFFFF);
    assert!(!machine.get_state().flags.get_carry());
}

#[test]
fn xor_self_zeroes_and_sets_zero_flag() {
    let machine = run(&[
        0x01, 0x00, 0xAB, 0xCD, // mov ax, 0xABCD
        0x08, 0x00, 0x00, // xor ax, ax
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0);
    assert!(machine.get_state().flags.get_zero());
}

#[test]
fn not_inverts() {
    let machine = run(&[
        0x01, 0x00, 0x00, 0xFF, // mov ax, 0x00FF
        0x09, 0x00, // not ax
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0xFF00);
    assert!(machine.get_state().flags.get_sign());
}

#[test]
fn inc_wraps_to_zero_without_carry() {
    let machine = run(&[
        0x01, 0x00, 0xFF, 0xFF, // mov ax, 0xFFFF
        0x0E, 0x00, // inc ax
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0);
    assert!(machine.get_state().flags.get_zero());
    assert!(!machine.get_state().flags.get_carry());
}

#[test]
fn dec_wraps_below_zero() {
    let machine = run(&[
        0x0F, 0x01, // dec bx (bx = 0)
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::BX), 0xFFFF);
    assert!(machine.get_state().flags.get_sign());
}

#[test]
fn mul_widens_into_dx() {
    let machine = run(&[
        0x01, 0x00, 0x80, 0x00, // mov ax, 0x8000
        0x01, 0x01, 0x00, 0x04, // mov bx, 4
        0x10, 0x01, // mul bx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::DX), 2);
    assert_eq!(machine.reg_read(Reg::AX), 0);
    assert!(machine.get_state().flags.get_carry());
}

#[test]
fn div_leaves_quotient_and_remainder() {
    let machine = run(&[
        0x01, 0x00, 0x00, 0x11, // mov ax, 17
        0x01, 0x01, 0x00, 0x05, // mov bx, 5
        0x11, 0x01, // div bx
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 3);
    assert_eq!(machine.reg_read(Reg::DX), 2);
}

#[test]
fn shl_shifts_out_through_carry() {
    let machine = run(&[
        0x01, 0x00, 0x80, 0x01, // mov ax, 0x8001
        0x06, 0x00, 0x01, // shl ax, 1
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0x0002);
    assert!(machine.get_state().flags.get_carry());
}

#[test]
fn shift_by_zero_leaves_carry_clear() {
    let machine = run(&[
        0x23, // stc
        0x01, 0x00, 0x12, 0x34, // mov ax, 0x1234
        0x06, 0x00, 0x00, // shl ax, 0
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0x1234);
    assert!(!machine.get_state().flags.get_carry());
}

#[test]
fn rotates_carry_the_wrapped_bit() {
    let machine = run(&[
        0x01, 0x00, 0x80, 0x00, // mov ax, 0x8000
        0x28, 0x00, 0x01, // rol ax, 1
        0x01, 0x01, 0x00, 0x01, // mov bx, 1
        0x29, 0x01, 0x01, // ror bx, 1
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0x0001);
    assert_eq!(machine.reg_read(Reg::BX), 0x8000);
    assert!(machine.get_state().flags.get_carry());
}

#[test]
fn rotate_right_undoes_rotate_left() {
    let machine = run(&[
        0x01, 0x00, 0xAB, 0xCD, // mov ax, 0xABCD
        0x28, 0x00, 0x05, // rol ax, 5
        0x29, 0x00, 0x05, // ror ax, 5
        0xFF,
    ]);
    assert_eq!(machine.reg_read(Reg::AX), 0xABCD);
}

#[test]
fn carry_control_ops() {
    let machine = run(&[0x23, 0xFF]);
    assert!(machine.get_state().flags.get_carry());
    let machine = run(&[0x23, 0x22, 0xFF]);
    assert!(!machine.get_state().flags.get_carry());
}

#[test]
fn interrupt_enable_flag_follows_sti_cli() {
    let machine = run(&[0x13, 0x01, 0xFF]);
    assert!(machine.get_state().flags.get_interrupt_enable());
    let machine = run(&[0x13, 0x01, 0x13, 0x00, 0xFF]);
    assert!(!machine.get_state().flags.get_interrupt_enable());
}
