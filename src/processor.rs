//! Instruction execution engine.
//!
//! The processor dispatches one instruction at a time. Arithmetic and
//! comparison instructions decode their packed operands through the
//! [`operand`](crate::operand) codec; `Interrupt` is forwarded to the
//! hardware facade. Kernel-reserved opcodes fault when they reach the
//! processor directly, so a misrouted instruction never executes silently.
//!
//! All arithmetic uses wrapping `i32` semantics. Division by zero is a fatal
//! [`ExecutionFault`] rather than a host trap.

use crate::errors::{codes, Component, ExecutionFault};
use crate::hardware::Hardware;
use crate::isa::{Instruction, Opcode};
use crate::operand;

/// Comparison sub-operations selected by the first `Compare` parameter byte.
mod selector {
    pub const EQUAL: u8 = 0;
    pub const NOT_EQUAL: u8 = 1;
    pub const LESS_THAN: u8 = 2;
    pub const GREATER_THAN: u8 = 3;
}

/// Executes instructions against an injected hardware facade.
pub struct Processor<H> {
    hardware: H,
}

impl<H: Hardware> Processor<H> {
    /// Creates a processor owning the given hardware facade.
    pub fn new(hardware: H) -> Self {
        Self { hardware }
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Executes one instruction, returning its result bytes.
    ///
    /// A fault means the instruction must not take effect; the caller decides
    /// whether the fault stops one program or the whole machine.
    pub fn execute(&mut self, instr: &Instruction) -> Result<Vec<u8>, ExecutionFault> {
        match instr.opcode {
            Opcode::Allocate
            | Opcode::Assign
            | Opcode::Move
            | Opcode::Addr
            | Opcode::Label
            | Opcode::Goto
            | Opcode::Clear => Err(ExecutionFault::kernel(codes::RESERVED_OPCODE)),
            Opcode::Interrupt => self.interrupt(&instr.params),
            Opcode::Compare => compare(&instr.params),
            Opcode::Add => Ok(arithmetic(&instr.params, i32::wrapping_add)),
            Opcode::Subtract => Ok(arithmetic(&instr.params, i32::wrapping_sub)),
            Opcode::Multiply => Ok(arithmetic(&instr.params, i32::wrapping_mul)),
            Opcode::Divide => {
                let (a, b) = operand::decode_pair(&instr.params);
                if b == 0 {
                    return Err(ExecutionFault::cpu(codes::DIVIDE_BY_ZERO));
                }
                Ok(a.wrapping_div(b).to_le_bytes().to_vec())
            }
        }
    }

    /// Reports a kernel-tagged error through the facade and requests a
    /// halt with exit code 1. For callers outside opcode dispatch that need
    /// to signal through the same channel.
    pub fn report_fatal(&mut self, code: i32) {
        self.hardware.error(Component::Kernel, code);
        self.hardware.halt(1);
    }

    /// Requests an unconditional clean machine stop.
    pub fn halt(&mut self) {
        self.hardware.halt(0);
    }

    fn interrupt(&mut self, params: &[u8]) -> Result<Vec<u8>, ExecutionFault> {
        if params.len() != 1 {
            return Err(ExecutionFault::cpu(codes::INTERRUPT_ARITY));
        }
        Ok(self.hardware.interrupt(params[0]))
    }
}

/// Decodes both operands and applies `op`, encoding the result little-endian.
fn arithmetic(params: &[u8], op: fn(i32, i32) -> i32) -> Vec<u8> {
    let (a, b) = operand::decode_pair(params);
    op(a, b).to_le_bytes().to_vec()
}

/// Runs the comparison selected by the first parameter byte over the packed
/// operands in the rest, producing a single `1`/`0` byte.
fn compare(params: &[u8]) -> Result<Vec<u8>, ExecutionFault> {
    if params.len() < 3 {
        return Err(ExecutionFault::cpu(codes::COMPARE_ARITY));
    }
    let (a, b) = operand::decode_pair(&params[1..]);
    let outcome = match params[0] {
        selector::EQUAL => a == b,
        selector::NOT_EQUAL => a != b,
        selector::LESS_THAN => a < b,
        selector::GREATER_THAN => a > b,
        _ => return Err(ExecutionFault::cpu(codes::COMPARE_SELECTOR)),
    };
    Ok(vec![outcome as u8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::encode_pair;

    /// Records every facade call and echoes interrupt codes back as bytes.
    #[derive(Default)]
    struct MockHardware {
        errors: Vec<(Component, i32)>,
        halted: Option<i32>,
        interrupts: Vec<u8>,
    }

    impl Hardware for MockHardware {
        fn error(&mut self, component: Component, code: i32) {
            self.errors.push((component, code));
        }

        fn halt(&mut self, exit_code: i32) {
            if self.halted.is_none() {
                self.halted = Some(exit_code);
            }
        }

        fn interrupt(&mut self, code: u8) -> Vec<u8> {
            self.interrupts.push(code);
            vec![code]
        }

        fn halted(&self) -> Option<i32> {
            self.halted
        }
    }

    fn processor() -> Processor<MockHardware> {
        Processor::new(MockHardware::default())
    }

    fn exec(opcode: Opcode, params: Vec<u8>) -> Result<Vec<u8>, ExecutionFault> {
        processor().execute(&Instruction::new(opcode, params))
    }

    #[test]
    fn add_packed_operands() {
        let result = exec(Opcode::Add, vec![5, 0, 0, 0, 254, 3, 0, 0, 0]).unwrap();
        assert_eq!(result, 8i32.to_le_bytes());
    }

    #[test]
    fn arithmetic_over_full_range() {
        for (op, a, b, want) in [
            (Opcode::Add, i32::MAX, 1, i32::MIN),
            (Opcode::Subtract, 5, 9, -4),
            (Opcode::Multiply, -3, 7, -21),
            (Opcode::Divide, 20, -4, -5),
            (Opcode::Divide, i32::MIN, -1, i32::MIN),
        ] {
            let result = exec(op, encode_pair(a, b)).unwrap();
            assert_eq!(result, want.to_le_bytes(), "{:?} {} {}", op, a, b);
        }
    }

    #[test]
    fn divide_by_zero_faults() {
        let fault = exec(Opcode::Divide, encode_pair(9, 0)).unwrap_err();
        assert_eq!(fault, ExecutionFault::cpu(codes::DIVIDE_BY_ZERO));
    }

    #[test]
    fn compare_selectors() {
        for (sel, a, b, want) in [
            (0u8, 4, 4, 1u8),
            (0, 4, 5, 0),
            (1, 4, 5, 1),
            (1, 4, 4, 0),
            (2, -1, 3, 1),
            (2, 5, 3, 0),
            (3, 5, 3, 1),
            (3, -2, 3, 0),
        ] {
            let mut params = vec![sel];
            params.extend(encode_pair(a, b));
            assert_eq!(
                exec(Opcode::Compare, params).unwrap(),
                vec![want],
                "selector {} on ({}, {})",
                sel,
                a,
                b
            );
        }
    }

    #[test]
    fn compare_less_than_scenario() {
        // Selector 2 with 5 < 3 must be falsy.
        let result = exec(Opcode::Compare, vec![2, 5, 0, 0, 0, 254, 3, 0, 0, 0]).unwrap();
        assert_eq!(result, vec![0]);
    }

    #[test]
    fn compare_needs_three_parameter_bytes() {
        let fault = exec(Opcode::Compare, vec![0, 1]).unwrap_err();
        assert_eq!(fault, ExecutionFault::cpu(codes::COMPARE_ARITY));
    }

    #[test]
    fn compare_rejects_unknown_selector() {
        let fault = exec(Opcode::Compare, vec![7, 1, 2]).unwrap_err();
        assert_eq!(fault, ExecutionFault::cpu(codes::COMPARE_SELECTOR));
    }

    #[test]
    fn interrupt_forwards_result_verbatim() {
        let mut processor = processor();
        let result = processor
            .execute(&Instruction::new(Opcode::Interrupt, vec![9]))
            .unwrap();
        assert_eq!(result, vec![9]);
        assert_eq!(processor.hardware().interrupts, vec![9]);
    }

    #[test]
    fn interrupt_takes_exactly_one_byte() {
        let mut processor = processor();
        let fault = processor
            .execute(&Instruction::new(Opcode::Interrupt, vec![4, 5]))
            .unwrap_err();
        assert_eq!(fault, ExecutionFault::cpu(codes::INTERRUPT_ARITY));
        assert!(processor.hardware().interrupts.is_empty());

        let fault = processor
            .execute(&Instruction::new(Opcode::Interrupt, vec![]))
            .unwrap_err();
        assert_eq!(fault, ExecutionFault::cpu(codes::INTERRUPT_ARITY));
    }

    #[test]
    fn reserved_opcodes_fault_at_the_processor() {
        for opcode in [
            Opcode::Allocate,
            Opcode::Assign,
            Opcode::Move,
            Opcode::Addr,
            Opcode::Label,
            Opcode::Goto,
            Opcode::Clear,
        ] {
            let fault = exec(opcode, vec![]).unwrap_err();
            assert_eq!(
                fault,
                ExecutionFault::kernel(codes::RESERVED_OPCODE),
                "{:?}",
                opcode
            );
        }
    }

    #[test]
    fn report_fatal_signals_error_then_halt() {
        let mut processor = processor();
        processor.report_fatal(6);
        assert_eq!(processor.hardware().errors, vec![(Component::Kernel, 6)]);
        assert_eq!(processor.hardware().halted, Some(1));
    }

    #[test]
    fn halt_is_a_clean_stop() {
        let mut processor = processor();
        processor.halt();
        assert!(processor.hardware().errors.is_empty());
        assert_eq!(processor.hardware().halted, Some(0));
    }
}
