//! ABI of the token contracts the module talks to
//!
//! Synthetic contracts deployed for native coins implement the full
//! interface, including the privileged `mint` and `burnCoins`. Externally
//! owned contracts only need the ERC20 subset.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);

        /// Only callable by the contract owner (the ERC20 module account)
        function mint(address to, uint256 amount) external;
        /// Only callable by the contract owner (the ERC20 module account)
        function burnCoins(address from, uint256 amount) external;
    }
}
