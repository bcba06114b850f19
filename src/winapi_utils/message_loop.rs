//! Thread message loop utilities.
//!
//! Low-level hooks deliver their callbacks through the message queue of the
//! thread that installed them, so the input worker pumps messages until a
//! `WM_QUIT` is posted to it from another thread.

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
    PM_NOREMOVE, WM_QUIT,
};

pub fn current_thread_id() -> u32 {
    unsafe { GetCurrentThreadId() }
}

/// Forces creation of the calling thread's message queue.
///
/// `PostThreadMessageW` fails for threads without a queue, so this must run
/// before the thread id is handed to anyone who may post a quit message.
pub fn ensure_message_queue() {
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }
}

/// Runs the message loop on the calling thread until `WM_QUIT` is received.
///
/// # Important
/// If this loop is blocked or too slow, Windows silently removes the
/// low-level hooks installed on this thread.
pub fn run_message_loop() {
    tracing::debug!(thread_id = current_thread_id(), "Message loop starting");

    let mut msg = MSG::default();

    unsafe {
        // GetMessageW returns:
        // - Positive: message retrieved
        // - 0: WM_QUIT received
        // - -1: error occurred
        loop {
            match GetMessageW(&mut msg, None, 0, 0).0 {
                0 => break,
                -1 => {
                    tracing::error!("GetMessageW failed, leaving message loop");
                    break;
                }
                _ => {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
    }

    tracing::debug!("Message loop exited");
}

/// Posts `WM_QUIT` to the message loop running on `thread_id`.
///
/// Can be called from any thread.
pub fn post_quit_message(thread_id: u32) {
    let result = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };

    if let Err(e) = result {
        tracing::error!(?e, thread_id, "Failed to post quit message");
    } else {
        tracing::debug!(thread_id, "Posted quit message");
    }
}
