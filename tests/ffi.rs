// C ABI tests: the exported functions called the way a C host would.

use msgbuf_shim::ffi::{
    msgbuf_align, msgbuf_check_layout, msgbuf_create, msgbuf_create_zeroed, msgbuf_destroy,
    msgbuf_size, MSGBUF_ERROR_LAYOUT_MISMATCH, MSGBUF_SUCCESS,
};
use msgbuf_shim::{MessageBuffer, RawMessage, MSG_ALIGN, MSG_SIZE};
use std::ptr;

#[test]
fn test_create_and_destroy() {
    let handle = msgbuf_create();
    assert!(!handle.is_null());
    assert_eq!(handle as usize % msgbuf_align(), 0);

    // Simulate the native library initializing the block
    unsafe { ptr::write_bytes(handle as *mut u8, 0x5A, msgbuf_size()) };
    unsafe { msgbuf_destroy(handle) };
}

#[test]
fn test_create_zeroed() {
    let handle = msgbuf_create_zeroed();
    assert!(!handle.is_null());

    let bytes = unsafe { std::slice::from_raw_parts(handle as *const u8, msgbuf_size()) };
    assert!(bytes.iter().all(|&b| b == 0));

    unsafe { msgbuf_destroy(handle) };
}

#[test]
fn test_destroy_null_is_noop() {
    unsafe { msgbuf_destroy(ptr::null_mut()) };
}

#[test]
fn test_many_handles_are_distinct() {
    let handles: Vec<*mut RawMessage> = (0..32).map(|_| msgbuf_create()).collect();
    assert!(handles.iter().all(|h| !h.is_null()));

    let mut addrs: Vec<usize> = handles.iter().map(|&h| h as usize).collect();
    addrs.sort_unstable();
    addrs.dedup();
    assert_eq!(addrs.len(), handles.len());

    for h in handles {
        unsafe { msgbuf_destroy(h) };
    }
}

#[test]
fn test_handoff_between_rust_and_c() {
    // Created in Rust, released through the C entry point
    let raw = MessageBuffer::create().unwrap().into_raw();
    unsafe { msgbuf_destroy(raw) };

    // Created through the C entry point, released by Rust ownership
    let handle = msgbuf_create();
    let owned = unsafe { MessageBuffer::from_raw(handle) }.expect("allocation succeeded");
    drop(owned);
}

#[test]
fn test_layout_check() {
    assert_eq!(msgbuf_size(), MSG_SIZE);
    assert_eq!(msgbuf_align(), MSG_ALIGN);
    assert_eq!(msgbuf_check_layout(MSG_SIZE, MSG_ALIGN), MSGBUF_SUCCESS);
    assert_eq!(
        msgbuf_check_layout(48, MSG_ALIGN),
        MSGBUF_ERROR_LAYOUT_MISMATCH
    );
    assert_eq!(
        msgbuf_check_layout(MSG_SIZE, 16),
        MSGBUF_ERROR_LAYOUT_MISMATCH
    );
}
