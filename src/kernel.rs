//! Process table and tick-driven scheduling.
//!
//! The kernel owns every loaded program and advances each one by a single
//! instruction per [`Kernel::step`] call. Processor-tier instructions are
//! delegated to the [`Processor`]; the kernel itself executes the reserved
//! tier (memory management, data movement, control transfer) against a
//! per-process variable table charged to a machine-wide memory budget.
//!
//! # Execution model
//!
//! - Single-threaded and cooperative: one control flow steps all programs,
//!   one instruction at a time, in load order.
//! - A processor result is latched in the process accumulator, where a
//!   following `Assign` can capture it.
//! - Any [`ExecutionFault`] is fatal to the machine: the kernel forwards the
//!   `(component, code)` pair to the hardware facade, requests a halt with
//!   exit code 1, and returns the fault to the caller.
//! - A hardware halt request clears the process table; the latched exit code
//!   is exposed through [`Kernel::exit_code`].

use crate::errors::{codes, ExecutionFault};
use crate::hardware::Hardware;
use crate::isa::{Instruction, Opcode};
use crate::operand;
use crate::processor::Processor;
use std::collections::HashMap;

/// Default kernel memory budget: 1 MiB.
pub const DEFAULT_MEMORY: usize = 1024 * 1024;

/// Built-in firmware image started by the CLI `--bios` flag.
///
/// DIF encoding of: `LABEL 0`, `ADD 2, 2`, `INT nop`. The `ADD` frame
/// carries embedded zero parameter bytes on purpose, so loading the BIOS
/// also exercises the codec's frame-start ambiguity rule.
pub const BIOS_IMAGE: &[u8] = &[
    0, 10, 0, 255, // LABEL 0
    0, 0, 2, 0, 0, 0, 254, 2, 0, 0, 0, 255, // ADD 2, 2
    0, 6, 0, 255, // INT 0
];

/// Variable storage plus the size it was allocated with.
///
/// A cleared slot keeps its vector (emptied) so alias indices stay valid.
struct Slot {
    data: Vec<u8>,
    size: usize,
}

/// One loaded program and its execution state.
struct Process {
    instructions: Vec<Instruction>,
    /// Index of the next instruction to execute.
    ip: usize,
    /// Label id to instruction position, collected when the program starts.
    labels: HashMap<u8, usize>,
    /// Variable storage. `vars` maps a one-byte id to a slot index, so
    /// `Addr` can bind two ids to the same slot.
    slots: Vec<Slot>,
    vars: HashMap<u8, usize>,
    /// Most recent processor result bytes.
    last: Vec<u8>,
}

/// Machine-wide allocation accounting.
struct MemoryBudget {
    capacity: usize,
    used: usize,
}

/// Owns the process table and drives execution one tick at a time.
pub struct Kernel<H> {
    processor: Processor<H>,
    memory: MemoryBudget,
    processes: Vec<Process>,
}

impl<H: Hardware> Kernel<H> {
    /// Creates a kernel with the given memory budget in bytes.
    pub fn new(memory_size: usize, hardware: H) -> Self {
        Self {
            processor: Processor::new(hardware),
            memory: MemoryBudget {
                capacity: memory_size,
                used: 0,
            },
            processes: Vec::new(),
        }
    }

    /// Loads a program into the process table.
    ///
    /// Label positions are collected up front; when a label id is defined
    /// twice, the later definition wins.
    pub fn start(&mut self, program: Vec<Instruction>) {
        let labels = program
            .iter()
            .enumerate()
            .filter(|(_, instr)| instr.opcode == Opcode::Label && !instr.params.is_empty())
            .map(|(pos, instr)| (instr.params[0], pos))
            .collect();
        self.processes.push(Process {
            instructions: program,
            ip: 0,
            labels,
            slots: Vec::new(),
            vars: HashMap::new(),
            last: Vec::new(),
        });
    }

    /// Advances every running program by one instruction.
    ///
    /// Returns the first fault encountered; the fault has already been
    /// reported through the hardware facade and the machine halt requested
    /// by the time the caller sees it.
    pub fn step(&mut self) -> Result<(), ExecutionFault> {
        let mut idx = 0;
        while idx < self.processes.len() {
            if self.processor.hardware().halted().is_some() {
                break;
            }
            let finished = {
                let process = &mut self.processes[idx];
                if process.ip >= process.instructions.len() {
                    true
                } else {
                    match Self::advance(process, &mut self.processor, &mut self.memory) {
                        Ok(()) => process.ip >= process.instructions.len(),
                        Err(fault) => {
                            self.processor.hardware_mut().error(fault.component, fault.code);
                            self.processor.hardware_mut().halt(1);
                            return Err(fault);
                        }
                    }
                }
            };
            if finished {
                let mut process = self.processes.remove(idx);
                self.memory.used -= Self::release_all(&mut process);
            } else {
                idx += 1;
            }
        }
        if self.processor.hardware().halted().is_some() {
            for process in &mut self.processes {
                self.memory.used -= Self::release_all(process);
            }
            self.processes.clear();
        }
        Ok(())
    }

    /// Returns every loaded program for re-encoding.
    pub fn save(&self) -> Vec<Vec<Instruction>> {
        self.processes
            .iter()
            .map(|p| p.instructions.clone())
            .collect()
    }

    /// Number of programs still running.
    pub fn running(&self) -> usize {
        self.processes.len()
    }

    /// Exit code latched by the hardware facade, if a halt was requested.
    pub fn exit_code(&self) -> Option<i32> {
        self.processor.hardware().halted()
    }

    /// Bytes currently charged against the memory budget.
    pub fn memory_in_use(&self) -> usize {
        self.memory.used
    }

    /// Executes one instruction of `process` and advances its instruction
    /// pointer.
    fn advance(
        process: &mut Process,
        processor: &mut Processor<H>,
        memory: &mut MemoryBudget,
    ) -> Result<(), ExecutionFault> {
        let instr = process.instructions[process.ip].clone();
        match instr.opcode {
            Opcode::Allocate => Self::allocate(process, memory, &instr.params)?,
            Opcode::Assign => Self::assign(process, &instr.params)?,
            Opcode::Move => Self::move_var(process, &instr.params)?,
            Opcode::Addr => Self::alias(process, memory, &instr.params)?,
            Opcode::Clear => {
                let id = first_param(&instr.params)?;
                if !process.vars.contains_key(&id) {
                    return Err(ExecutionFault::kernel(codes::UNBOUND_VARIABLE));
                }
                Self::unbind(process, memory, id);
            }
            Opcode::Label => {}
            Opcode::Goto => {
                let id = first_param(&instr.params)?;
                let target = *process
                    .labels
                    .get(&id)
                    .ok_or(ExecutionFault::kernel(codes::UNDEFINED_LABEL))?;
                // Resume at the instruction after the label.
                process.ip = target + 1;
                return Ok(());
            }
            Opcode::Add
            | Opcode::Subtract
            | Opcode::Divide
            | Opcode::Multiply
            | Opcode::Interrupt
            | Opcode::Compare => {
                process.last = processor.execute(&instr)?;
            }
        }
        process.ip += 1;
        Ok(())
    }

    /// `ALLOC id, size`: reserves `size` zeroed bytes for a variable,
    /// charged against the memory budget. Rebinding an id releases its
    /// previous storage first.
    fn allocate(
        process: &mut Process,
        memory: &mut MemoryBudget,
        params: &[u8],
    ) -> Result<(), ExecutionFault> {
        let id = first_param(params)?;
        let (size, _) = operand::decode_pair(&params[1..]);
        if size < 0 {
            return Err(ExecutionFault::kernel(codes::MALFORMED_PARAMS));
        }
        let size = size as usize;
        if memory.used + size > memory.capacity {
            return Err(ExecutionFault::kernel(codes::OUT_OF_MEMORY));
        }
        Self::unbind(process, memory, id);
        memory.used += size;
        process.slots.push(Slot {
            data: vec![0; size],
            size,
        });
        process.vars.insert(id, process.slots.len() - 1);
        Ok(())
    }

    /// `ASSIGN id, data…`: writes the parameter bytes after the id into the
    /// variable. With no data bytes, captures the process accumulator
    /// (the most recent processor result) instead. Writes are truncated to
    /// the variable's allocated size.
    fn assign(process: &mut Process, params: &[u8]) -> Result<(), ExecutionFault> {
        let id = first_param(params)?;
        let slot_idx = *process
            .vars
            .get(&id)
            .ok_or(ExecutionFault::kernel(codes::UNBOUND_VARIABLE))?;
        let mut data = if params.len() > 1 {
            params[1..].to_vec()
        } else {
            process.last.clone()
        };
        let slot = &mut process.slots[slot_idx];
        data.truncate(slot.size);
        slot.data = data;
        Ok(())
    }

    /// `MOVE dst, src`: copies the source variable's bytes into the
    /// destination, truncated to the destination's allocated size.
    fn move_var(process: &mut Process, params: &[u8]) -> Result<(), ExecutionFault> {
        let &[dst, src] = params else {
            return Err(ExecutionFault::kernel(codes::MALFORMED_PARAMS));
        };
        let lookup = |id: u8| {
            process
                .vars
                .get(&id)
                .copied()
                .ok_or(ExecutionFault::kernel(codes::UNBOUND_VARIABLE))
        };
        let (dst_idx, src_idx) = (lookup(dst)?, lookup(src)?);
        let mut data = process.slots[src_idx].data.clone();
        let slot = &mut process.slots[dst_idx];
        data.truncate(slot.size);
        slot.data = data;
        Ok(())
    }

    /// `ADDR dst, src`: binds the destination id to the source variable's
    /// storage, so both ids address the same bytes.
    fn alias(
        process: &mut Process,
        memory: &mut MemoryBudget,
        params: &[u8],
    ) -> Result<(), ExecutionFault> {
        let &[dst, src] = params else {
            return Err(ExecutionFault::kernel(codes::MALFORMED_PARAMS));
        };
        let src_idx = *process
            .vars
            .get(&src)
            .ok_or(ExecutionFault::kernel(codes::UNBOUND_VARIABLE))?;
        Self::unbind(process, memory, dst);
        process.vars.insert(dst, src_idx);
        Ok(())
    }

    /// Removes a variable binding, releasing the slot's bytes once no other
    /// id references it.
    fn unbind(process: &mut Process, memory: &mut MemoryBudget, id: u8) {
        if let Some(slot_idx) = process.vars.remove(&id) {
            if !process.vars.values().any(|&idx| idx == slot_idx) {
                let slot = &mut process.slots[slot_idx];
                memory.used -= slot.size;
                slot.size = 0;
                slot.data = Vec::new();
            }
        }
    }

    /// Releases every live slot of a process, returning the bytes freed.
    fn release_all(process: &mut Process) -> usize {
        let mut freed = 0;
        for slot in &mut process.slots {
            freed += slot.size;
            slot.size = 0;
            slot.data = Vec::new();
        }
        process.vars.clear();
        freed
    }
}

/// First parameter byte, or a malformed-parameters fault.
fn first_param(params: &[u8]) -> Result<u8, ExecutionFault> {
    params
        .first()
        .copied()
        .ok_or(ExecutionFault::kernel(codes::MALFORMED_PARAMS))
}
