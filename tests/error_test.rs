#![allow(missing_docs)]

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use shadowptr::{
    BincodeReader, BincodeWriter, InputArchive, ObjectId, OutputArchive, Ptr, Saving,
    SessionState, ShadowError, Traverse,
};

#[derive(Serialize, Deserialize, Traverse, Debug, Default, PartialEq)]
struct Node {
    value: u32,
    next: Ptr<u32>,
}

/// Writes `values` through a plain writer and appends a hand-made table.
fn forge(values: &[Node], table: &[u32]) -> shadowptr::Result<Vec<u8>> {
    let mut writer = BincodeWriter::new(Vec::new());
    for value in values {
        writer.save(value)?;
    }
    writer.save(table)?;
    writer.finish()
}

/// Loads two nodes into caller-owned slots and completes the session.
///
/// The slots must stay where they are afterwards, or the restored pointers
/// dangle.
fn load_into<'a>(
    bytes: &'a [u8],
    first: &'a mut Node,
    second: &'a mut Node,
) -> shadowptr::Result<()> {
    let mut source = BincodeReader::new(bytes);
    let mut archive = InputArchive::new(&mut source);
    archive.invoke(first)?.invoke(second)?;
    archive.complete()
}

#[test]
fn test_unresolved_address() -> shadowptr::Result<()> {
    let outside = 5u32;
    let node = Node {
        value: 1,
        next: Ptr::new(&outside),
    };

    let mut sink = BincodeWriter::new(Vec::new());
    let mut archive = OutputArchive::new(&mut sink);
    archive.invoke(&node)?;

    let result = archive.complete();
    assert!(matches!(
        result,
        Err(ShadowError::UnresolvedAddress { pointer: 0, address })
            if address == &outside as *const u32 as usize
    ));
    assert!(archive.is_completed());
    // The session is over; dropping it must not report the failure again.
    drop(archive);
    sink.finish()?;
    Ok(())
}

#[test]
fn test_table_too_short() -> shadowptr::Result<()> {
    let nodes = [Node::default(), Node::default()];
    let bytes = forge(&nodes, &[0])?;

    let mut first = Node::default();
    let mut second = Node::default();
    let result = load_into(&bytes, &mut first, &mut second);
    assert!(matches!(
        result,
        Err(ShadowError::SizeMismatch {
            expected: 2,
            found: 1
        })
    ));
    Ok(())
}

#[test]
fn test_table_too_long() -> shadowptr::Result<()> {
    let nodes = [Node::default(), Node::default()];
    let bytes = forge(&nodes, &[0, 0, 0])?;

    let mut first = Node::default();
    let mut second = Node::default();
    let result = load_into(&bytes, &mut first, &mut second);
    assert!(matches!(
        result,
        Err(ShadowError::SizeMismatch {
            expected: 2,
            found: 3
        })
    ));
    Ok(())
}

#[test]
fn test_out_of_range_id_leaves_pointers_untouched() -> shadowptr::Result<()> {
    let nodes = [Node::default(), Node::default()];
    // Each node numbers `value` and `next`, so ids 1 to 4 are valid.
    let bytes = forge(&nodes, &[3, 99])?;

    let mut first = Node::default();
    let mut second = Node::default();
    let result = load_into(&bytes, &mut first, &mut second);
    assert!(matches!(
        result,
        Err(ShadowError::OutOfRangeId { pointer: 1, id, visited: 5 }) if id == ObjectId::new(99)
    ));
    assert!(first.next.is_null());
    assert!(second.next.is_null());
    Ok(())
}

#[test]
fn test_forged_table_in_range_is_applied() -> shadowptr::Result<()> {
    let nodes = [Node::default(), Node::default()];
    let bytes = forge(&nodes, &[3, 1])?;

    let mut first = Node::default();
    let mut second = Node::default();
    load_into(&bytes, &mut first, &mut second)?;
    // Both slots are asserted where they were loaded.
    assert!(first.next.points_to(&second.value));
    assert!(second.next.points_to(&first.value));
    Ok(())
}

#[test]
fn test_use_after_complete() -> shadowptr::Result<()> {
    let value = 3u32;
    let late = 4u32;

    let mut sink = BincodeWriter::new(Vec::new());
    {
        let mut archive = OutputArchive::new(&mut sink);
        archive.invoke(&value)?;
        archive.complete()?;
        assert!(matches!(
            archive.invoke(&late),
            Err(ShadowError::UseAfterComplete)
        ));
    }
    let bytes = sink.finish()?;

    let mut source = BincodeReader::new(bytes.as_slice());
    let mut value_load = 0u32;
    let mut late_load = 17u32;
    {
        let mut archive = InputArchive::new(&mut source);
        archive.invoke(&mut value_load)?;
        archive.complete()?;
        assert!(matches!(
            archive.invoke(&mut late_load),
            Err(ShadowError::UseAfterComplete)
        ));
    }

    assert_eq!(value_load, 3);
    assert_eq!(late_load, 17);
    Ok(())
}

#[test]
fn test_complete_is_idempotent() -> shadowptr::Result<()> {
    let value = 9u32;
    let ptr = Ptr::new(&value);

    let once = {
        let mut sink = BincodeWriter::new(Vec::new());
        {
            let mut archive = OutputArchive::new(&mut sink);
            archive.invoke(&value)?.invoke(&ptr)?;
            archive.complete()?;
        }
        sink.finish()?
    };

    let twice = {
        let mut sink = BincodeWriter::new(Vec::new());
        {
            let mut archive = OutputArchive::new(&mut sink);
            archive.invoke(&value)?.invoke(&ptr)?;
            archive.complete()?;
            archive.complete()?;
        }
        sink.finish()?
    };

    assert_eq!(once, twice);

    let mut source = BincodeReader::new(twice.as_slice());
    let mut value_load = 0u32;
    let mut ptr_load = Ptr::<u32>::null();
    {
        let mut archive = InputArchive::new(&mut source);
        archive.invoke(&mut value_load)?.invoke(&mut ptr_load)?;
        archive.complete()?;
        archive.complete()?;
    }
    // Nothing is left after the table.
    assert!(source.get_ref().is_empty());
    source.finish()?;
    Ok(())
}

#[test]
fn test_drop_failure_surfaces_on_writer() -> shadowptr::Result<()> {
    let outside = 1u8;
    let ptr = Ptr::new(&outside);

    let mut sink = BincodeWriter::new(Vec::new());
    {
        let mut archive = OutputArchive::new(&mut sink);
        archive.invoke(&ptr)?;
        assert_eq!(archive.pointers_tracked(), 1);
    }

    assert!(matches!(
        sink.save(&0u8),
        Err(ShadowError::UnresolvedAddress { .. })
    ));
    assert!(matches!(
        sink.finish(),
        Err(ShadowError::UnresolvedAddress { .. })
    ));
    Ok(())
}

#[test]
fn test_drop_failure_surfaces_on_reader() -> shadowptr::Result<()> {
    // A value without a trailing table.
    let mut writer = BincodeWriter::new(Vec::new());
    writer.save(&Node::default())?;
    let bytes = writer.finish()?;

    let mut source = BincodeReader::new(bytes.as_slice());
    let mut node = Node::default();
    {
        let mut archive = InputArchive::new(&mut source);
        archive.invoke(&mut node)?;
    }

    let result = source.finish();
    assert!(matches!(
        result,
        Err(ShadowError::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
    ));
    Ok(())
}

struct ReadOnlyDisk;

impl Write for ReadOnlyDisk {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only disk"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_archive_errors_pass_through() {
    let value = 300u32;
    let mut sink = BincodeWriter::new(ReadOnlyDisk);
    {
        let mut archive = OutputArchive::new(&mut sink);
        let result = archive.invoke(&value).map(|_| ());
        assert!(matches!(
            result,
            Err(ShadowError::Io(ref e)) if e.kind() == io::ErrorKind::PermissionDenied
        ));
        assert!(!archive.is_completed());
    }
    // The table write on drop fails as well and is kept by the writer.
    assert!(matches!(sink.finish(), Err(ShadowError::Io(_))));
}

#[test]
fn test_session_state() -> shadowptr::Result<()> {
    let mut sink = BincodeWriter::new(Vec::new());
    let mut archive = OutputArchive::new(&mut sink);
    assert!(!archive.is_completed());
    archive.complete()?;
    assert!(archive.is_completed());
    assert_ne!(SessionState::Active, SessionState::Completed);
    Ok(())
}
