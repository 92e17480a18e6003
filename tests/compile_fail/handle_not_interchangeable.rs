// ABOUTME: Compile-fail test verifying handles of different resource kinds are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use deckhand::types::{RoleHandle, SecurityGroupHandle};

fn as_role(group: SecurityGroupHandle) {
    // ERROR: expected RoleHandle, found SecurityGroupHandle
    let _role: RoleHandle = group;
}

fn main() {}
