//! Permission model properties exercised through the public API.

use userdao::{
    Permissions, UserRecord,
    permissions::{MaskKind, PermissionError, mask},
};

#[test]
fn test_every_bit_of_both_masks_is_addressable() {
    let mut perms = Permissions::default();
    for index in 0..64i64 {
        perms.set_permission(index, true).unwrap();
        assert!(perms.has_permission(index));
        assert!(!perms.has_flag(index));
    }
    assert_eq!(perms.permissions, u64::MAX);
    assert_eq!(perms.flags, 0);

    for index in 0..64i64 {
        perms.set_flag(index, true).unwrap();
        perms.set_permission(index, false).unwrap();
    }
    assert_eq!(perms, Permissions::new(0, u64::MAX));
}

#[test]
fn test_set_only_touches_target_bit() {
    let start = 0xF0F0_0F0F_AAAA_5555u64;
    for index in 0..64i64 {
        for value in [true, false] {
            let updated = mask::with_bit(MaskKind::Flag, start, index, value).unwrap();
            assert_eq!(mask::has_bit(updated, index), value);
            assert_eq!(updated & !(1 << index), start & !(1 << index));
        }
    }
}

#[test]
fn test_out_of_range_is_invalid_argument_and_never_mutates() {
    let mut user = UserRecord::new("alice");
    let model = user.permissions_mut();
    *model = Permissions::new(0b1010, 0b0101);

    for index in [-64i64, -1, 64, 128] {
        for kind in [MaskKind::Permission, MaskKind::Flag] {
            let err = model.set(kind, index, true).unwrap_err();
            assert_eq!(err, PermissionError::BitIndexOutOfRange { kind, index });
            let err: userdao::Error = err.into();
            assert!(err.is_invalid_argument());
        }
    }
    assert_eq!(*model, Permissions::new(0b1010, 0b0101));
}

#[test]
fn test_out_of_range_reads_are_false() {
    for index in [-1i64, 64, i64::MAX] {
        assert!(!mask::has_bit(u64::MAX, index));
    }
}
