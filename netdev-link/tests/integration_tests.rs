use netdev_core::{Error, IfIndex, IpPrefix};
use netdev_link::*;
use std::cell::RefCell;
use std::net::IpAddr;
use std::rc::Rc;

#[test]
fn test_mock_calls_follow_namespace_probe() {
    let current = Rc::new(RefCell::new("ns_a".to_string()));
    let probe = Rc::clone(&current);
    let link = MockLinkControl::new()
        .with_link("ns_a", 7, "gtp0")
        .with_mutations(true)
        .with_namespace_probe(move || probe.borrow().clone());

    let prefix: IpPrefix = "10.45.0.1/16".parse().unwrap();
    link.add_address("gtp0", prefix.addr(), prefix.prefix_len())
        .unwrap();

    *current.borrow_mut() = String::new();
    let result = link.add_address("gtp0", prefix.addr(), prefix.prefix_len());
    assert!(matches!(result, Err(Error::LinkControl { .. })));

    let netns: Vec<String> = link.calls().iter().map(|c| c.netns().to_string()).collect();
    assert_eq!(netns, vec!["ns_a", ""]);
    assert_eq!(link.link("ns_a", 7).unwrap().addresses.len(), 1);
}

#[test]
fn test_mock_removed_link_no_longer_resolves() {
    let link = MockLinkControl::new().with_link("", 4, "tun4");

    assert_eq!(link.resolve_name(IfIndex::from_raw(4)).unwrap(), "tun4");
    link.remove_link("", 4);

    assert!(matches!(
        link.resolve_name(IfIndex::from_raw(4)),
        Err(Error::NoSuchDevice { ifindex: 4 })
    ));
}

#[test]
fn test_link_state_serialization() {
    let state = LinkState { up: true, mtu: 9000 };

    let json = serde_json::to_string(&state).unwrap();
    let deserialized: LinkState = serde_json::from_str(&json).unwrap();

    assert_eq!(state, deserialized);
}

#[test]
fn test_system_link_control_as_trait_object() {
    let link: Rc<dyn LinkControl> = Rc::new(SystemLinkControl::new());

    let name = link.resolve_name(IfIndex::from_raw(1)).unwrap();
    assert_eq!(name, "lo");

    let state = link.link_state(&name).unwrap();
    assert!(state.up);

    let gw: IpAddr = "127.0.0.1".parse().unwrap();
    let result = link.add_route(&name, "10.0.0.0".parse().unwrap(), 8, Some(gw));
    assert!(matches!(result, Err(Error::Unsupported { .. })));
}

#[test]
fn test_system_link_state_unknown_device() {
    let link = SystemLinkControl::new();

    let result = link.link_state("nosuchdev0");
    assert!(matches!(result, Err(Error::LinkControl { .. })));
}
