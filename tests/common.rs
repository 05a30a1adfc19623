#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::{ReadStorage, Storage};

#[derive(Default)]
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
}

impl Eeprom {
    pub fn new(size: usize) -> Self {
        Self {
            buf: vec![0xFFu8; size],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn new_with_fault(size: usize, fail_after_operation: usize) -> Self {
        Self {
            buf: vec![0xFFu8; size],
            fail_after_operation,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn writes_at(&self, offset: u32) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Write { offset: o, .. } if *o == offset))
            .count()
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }
}

#[derive(Debug)]
pub struct EepromError;

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });

        // unlike flash, EEPROM cells rewrite in place with no erase cycle
        let offset = offset as usize;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}
