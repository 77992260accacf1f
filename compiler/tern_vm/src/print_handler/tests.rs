use super::*;

#[test]
fn buffer_println_appends_newline() {
    let handler = BufferPrintHandler::new();
    handler.println("hello");
    assert_eq!(handler.get_output(), "hello\n");
}

#[test]
fn buffer_print_concatenates() {
    let handler = BufferPrintHandler::new();
    handler.print("a");
    handler.print(" ");
    handler.println("b");
    assert_eq!(handler.get_output(), "a b\n");
}

#[test]
fn take_output_empties_buffer() {
    let handler = buffer_handler();
    handler.print("x");
    assert_eq!(handler.take_output(), "x");
    assert_eq!(handler.get_output(), "");
}

#[test]
fn clear_empties_buffer() {
    let handler = buffer_handler();
    handler.println("x");
    handler.clear();
    assert!(handler.get_output().is_empty());
}

#[test]
fn silent_and_stdout_capture_nothing() {
    let silent = silent_handler();
    silent.println("dropped");
    assert_eq!(silent.get_output(), "");

    let stdout = stdout_handler();
    stdout.clear();
    assert_eq!(stdout.take_output(), "");
}
