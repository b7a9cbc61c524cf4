use team_manager_server::domain::permissions::{
    check_user_delete, check_user_update, require_admin, require_admin_or_owner,
    require_super_admin, Principal,
};
use team_manager_server::error::AppError;
use uuid::Uuid;

fn user(n: u128) -> Principal {
    Principal {
        id: Uuid::from_u128(n),
        is_admin: false,
        is_super_admin: false,
    }
}

fn admin(n: u128) -> Principal {
    Principal {
        is_admin: true,
        ..user(n)
    }
}

fn super_admin(n: u128) -> Principal {
    Principal {
        is_super_admin: true,
        ..user(n)
    }
}

#[test]
fn role_gates() {
    assert!(require_admin(&admin(1)).is_ok());
    assert!(require_admin(&super_admin(1)).is_ok());
    assert!(matches!(require_admin(&user(1)), Err(AppError::AdminRequired)));

    assert!(require_super_admin(&super_admin(1)).is_ok());
    assert!(matches!(
        require_super_admin(&admin(1)),
        Err(AppError::SuperAdminRequired)
    ));
}

#[test]
fn players_act_on_their_own_record() {
    let player = Uuid::from_u128(50);
    assert!(require_admin_or_owner(&user(1), Some(player), player).is_ok());
    assert!(require_admin_or_owner(&user(1), Some(player), Uuid::from_u128(51)).is_err());
    assert!(require_admin_or_owner(&user(1), None, player).is_err());
    assert!(require_admin_or_owner(&admin(1), None, player).is_ok());
}

#[test]
fn everyone_may_update_themselves() {
    for actor in [user(1), admin(1), super_admin(1)] {
        assert!(check_user_update(&actor, &actor, true).is_ok());
    }
}

#[test]
fn admins_update_regular_users_but_not_their_passwords() {
    assert!(check_user_update(&admin(1), &user(2), false).is_ok());
    assert!(matches!(
        check_user_update(&admin(1), &user(2), true),
        Err(AppError::AdminRequired)
    ));
    assert!(matches!(
        check_user_update(&admin(1), &admin(2), false),
        Err(AppError::CantUpdateAdminUser)
    ));
    assert!(matches!(
        check_user_update(&user(1), &user(2), false),
        Err(AppError::AdminRequired)
    ));
}

#[test]
fn super_admins_update_anyone() {
    assert!(check_user_update(&super_admin(1), &admin(2), true).is_ok());
    assert!(check_user_update(&super_admin(1), &super_admin(2), false).is_ok());
}

#[test]
fn delete_matrix() {
    assert!(matches!(
        check_user_delete(&super_admin(1), &super_admin(1)),
        Err(AppError::CantDeleteYourself)
    ));
    assert!(check_user_delete(&super_admin(1), &admin(2)).is_ok());
    assert!(check_user_delete(&admin(1), &user(2)).is_ok());
    assert!(matches!(
        check_user_delete(&admin(1), &admin(2)),
        Err(AppError::CantUpdateAdminUser)
    ));
    assert!(matches!(
        check_user_delete(&user(1), &user(2)),
        Err(AppError::AdminRequired)
    ));
}
