// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 网络共享设备与外网 IP 查询实现
pub mod adb_device;
pub mod ip_probe;
