//! Token contract surface.
//!
//! The demo tokens are ERC-20s with an OpenZeppelin-style pause switch; the
//! protection service freezes them by calling `pause()` on detection.

use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IPausableToken {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function paused() external view returns (bool);
    }
}
