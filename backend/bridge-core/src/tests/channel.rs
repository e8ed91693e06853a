// Unit tests for the channel capability table

use crate::channel::{
    ChannelCapability, ChannelDirection, ChannelRegistry, DB_EXECUTE, DB_QUERY, DB_TRANSACTION,
    EXAMPLE_CHANNEL, WINDOW_CLOSE, WINDOW_IS_MAXIMIZED, WINDOW_MAXIMIZE, WINDOW_MINIMIZE,
    WINDOW_UNMAXIMIZE,
};

/// **VALUE**: Verifies the table is closed-world: names not listed are
/// denied in every direction.
///
/// **WHY THIS MATTERS**: The capability table is the sole authorization
/// boundary between the sandboxed renderer and the host. Default-allow
/// anywhere would hand the renderer ambient host access.
///
/// **BUG THIS CATCHES**: Would catch a registry that falls back to
/// "allow" for unknown names, or one that pattern-matches instead of
/// comparing literal names.
#[test]
fn given_default_table_when_unknown_channel_checked_then_denied() {
    // GIVEN: The production capability table
    let registry = ChannelRegistry::default_table();

    // WHEN/THEN: An unlisted name is denied in every direction
    for direction in [
        ChannelDirection::Send,
        ChannelDirection::Invoke,
        ChannelDirection::Event,
    ] {
        assert!(
            !registry.is_allowed("no-such-channel", direction),
            "Unknown channel must be denied for {direction:?}"
        );
    }
    assert!(!registry.is_known("no-such-channel"));
}

/// **VALUE**: Verifies that a listed channel is still denied in a
/// direction it does not permit.
///
/// **WHY THIS MATTERS**: Directions are part of the capability. If
/// `db:query` accepted fire-and-forget sends, the renderer could issue
/// unacknowledged database traffic the correlation layer never sees.
///
/// **BUG THIS CATCHES**: Would catch a registry that checks name
/// membership only and ignores the direction.
#[test]
fn given_default_table_when_known_channel_used_in_wrong_direction_then_denied() {
    // GIVEN: The production capability table
    let registry = ChannelRegistry::default_table();

    // THEN: db channels invoke only
    assert!(!registry.is_allowed(DB_QUERY, ChannelDirection::Send));
    assert!(!registry.is_allowed(DB_QUERY, ChannelDirection::Event));

    // AND: the example channel never permits invoke
    assert!(!registry.is_allowed(EXAMPLE_CHANNEL, ChannelDirection::Invoke));
}

/// **VALUE**: Pins the production channel surface.
///
/// **WHY THIS MATTERS**: Every bridge entry point trusts this table.
/// Dropping a name here silently bricks that part of the UI; adding one
/// widens the renderer's reach into the host.
///
/// **BUG THIS CATCHES**: Would catch an accidental edit to the static
/// table - a removed window channel or a db channel granted extra
/// directions.
#[test]
fn given_default_table_when_production_channels_checked_then_allowed() {
    let registry = ChannelRegistry::default_table();

    assert!(registry.is_allowed(EXAMPLE_CHANNEL, ChannelDirection::Send));
    assert!(registry.is_allowed(EXAMPLE_CHANNEL, ChannelDirection::Event));

    for channel in [DB_QUERY, DB_EXECUTE, DB_TRANSACTION] {
        assert!(
            registry.is_allowed(channel, ChannelDirection::Invoke),
            "db channel '{channel}' must permit invoke"
        );
    }
    for channel in [
        WINDOW_MINIMIZE,
        WINDOW_MAXIMIZE,
        WINDOW_UNMAXIMIZE,
        WINDOW_CLOSE,
        WINDOW_IS_MAXIMIZED,
    ] {
        assert!(
            registry.is_allowed(channel, ChannelDirection::Invoke),
            "window channel '{channel}' must permit invoke"
        );
    }
}

/// **VALUE**: Verifies a custom capability list replaces (not extends)
/// the default table.
///
/// **WHY THIS MATTERS**: Embedders and tests build reduced surfaces. If
/// the default channels leaked into a custom registry, a locked-down
/// embedding would still expose the full db surface.
///
/// **BUG THIS CATCHES**: Would catch `with_capabilities` merging with
/// the static default list.
#[test]
fn given_custom_capabilities_when_registry_built_then_only_those_allowed() {
    // GIVEN: A registry with one send-only channel
    let registry = ChannelRegistry::with_capabilities(&[ChannelCapability {
        name: "telemetry",
        directions: &[ChannelDirection::Send],
    }]);

    // THEN: Only that capability exists
    assert!(registry.is_allowed("telemetry", ChannelDirection::Send));
    assert!(!registry.is_allowed("telemetry", ChannelDirection::Invoke));
    assert!(!registry.is_allowed(DB_QUERY, ChannelDirection::Invoke));
}
